//! Application state held by the store.
//!
//! `AppState` is a plain value: every field is owned data, so a clone is a
//! full independent copy. The store hands out clones and never references
//! into its own storage.

mod app_state;
mod models;

pub use app_state::{default_features, default_preferences, AppState};
pub use models::{
    AppError, AppStatus, CaptureArea, CaptureMode, ConfigSnapshot, PerformanceMetrics,
    ProcessingState, ScreenshotRecord, ServiceHealth, ToastKind, Translation, UiState,
};

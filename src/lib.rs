//! # State Store
//!
//! A centralized, action-driven application state store. All state lives
//! in one [`AppState`]; every change is an [`Action`] run through a
//! middleware pipeline and a pure reducer.
//!
//! ## Core Concepts
//!
//! - **Actions**: Immutable, typed change requests with a closed set of
//!   discriminators
//! - **Reducers**: Pure `(state, action) -> state` functions
//! - **Middleware**: Hooks before (may veto or transform) and after every commit
//! - **History**: Bounded ring of committed snapshots for time travel
//! - **Subscriptions**: Callbacks and channel watchers notified on change
//!
//! ## Example
//!
//! ```ignore
//! use statestore::{Action, AppState, Store, ValidationMiddleware};
//! use std::sync::Arc;
//!
//! let store = Store::new(AppState::default());
//! store.add_middleware(Arc::new(ValidationMiddleware::new()));
//!
//! store.subscribe(|state| println!("status: {}", state.status));
//!
//! let outcome = store.dispatch(Action::app_ready())?;
//! assert!(outcome.is_committed());
//!
//! // Most recent snapshot is the one APP_READY produced
//! let last = &store.get_history(1)[0];
//! ```

pub mod actions;
pub mod dispatch;
pub mod error;
pub mod history;
pub mod middleware;
pub mod reducers;
pub mod state;
pub mod store;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use actions::{Action, ActionPayload, ActionType, CacheKind, MetricsSample, UnknownActionType};
pub use dispatch::{DispatchOutcome, DispatchPhase, DispatchTicket};
pub use error::{MiddlewareError, ReducerError, Result, StoreError, ValidationError};
pub use history::StateSnapshot;
pub use middleware::{
    DevToolsConfig, DevToolsMiddleware, LogLevel, LoggingMiddleware, Middleware,
    PerformanceConfig, PerformanceMiddleware, ValidationMiddleware, Veto,
};
pub use reducers::{Reducer, ReducerConfig, Reduction, RootReducer};
pub use state::{AppState, AppStatus};
pub use store::{Store, StoreConfig};
pub use subscriptions::{
    DropReason, StateEvent, SubscriptionHandle, SubscriptionId, WatchConfig, WatchHandle,
};
pub use types::{ActionId, StateDigest, StoreMetrics, Timestamp};

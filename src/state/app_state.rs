//! The aggregate application state.

use super::models::{
    AppError, AppStatus, CaptureArea, CaptureMode, ConfigSnapshot, PerformanceMetrics,
    ProcessingState, ScreenshotRecord, ServiceHealth, Translation, UiState,
};
use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Version reported before the application announces its own.
const DEFAULT_VERSION: &str = "2.0.0";

/// Complete application state.
///
/// Cloning produces a fully independent copy; nothing in here is shared.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AppState {
    // Core
    pub status: AppStatus,
    pub version: String,
    pub last_updated: Timestamp,

    pub config: Option<ConfigSnapshot>,

    // Language and translation
    pub current_target_language: String,
    pub available_languages: Vec<String>,
    pub last_translation: Option<Translation>,
    pub translation_history: Vec<Translation>,

    // Screen capture
    pub capture_mode: CaptureMode,
    pub last_capture_area: Option<CaptureArea>,
    pub screenshot_history: Vec<ScreenshotRecord>,

    pub last_error: Option<AppError>,

    pub ui: UiState,
    pub processing: ProcessingState,
    pub performance: PerformanceMetrics,
    pub service_health: ServiceHealth,

    // Caches
    pub ocr_cache: BTreeMap<String, Value>,
    pub translation_cache: BTreeMap<String, Value>,

    pub features: BTreeMap<String, bool>,
    pub preferences: BTreeMap<String, Value>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            status: AppStatus::default(),
            version: DEFAULT_VERSION.to_string(),
            last_updated: Timestamp::default(),
            config: None,
            current_target_language: "en".to_string(),
            available_languages: Vec::new(),
            last_translation: None,
            translation_history: Vec::new(),
            capture_mode: CaptureMode::default(),
            last_capture_area: None,
            screenshot_history: Vec::new(),
            last_error: None,
            ui: UiState::default(),
            processing: ProcessingState::default(),
            performance: PerformanceMetrics::default(),
            service_health: ServiceHealth::default(),
            ocr_cache: BTreeMap::new(),
            translation_cache: BTreeMap::new(),
            features: default_features(),
            preferences: default_preferences(),
        }
    }
}

impl AppState {
    /// Default state with the given status.
    pub fn with_status(status: AppStatus) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn translation_count(&self) -> usize {
        self.translation_history.len()
    }

    pub fn success_rate(&self) -> f64 {
        self.performance.success_rate
    }

    /// True when every external engine reports healthy.
    pub fn is_healthy(&self) -> bool {
        self.service_health.ocr_service_healthy
            && self.service_health.translation_service_healthy
            && self.service_health.tts_service_healthy
    }

    /// Capture rectangle in effect; only area-select mode uses a stored area.
    pub fn active_capture_area(&self) -> Option<CaptureArea> {
        match self.capture_mode {
            CaptureMode::AreaSelect => self.last_capture_area,
            _ => None,
        }
    }

    pub fn feature_enabled(&self, name: &str) -> bool {
        self.features.get(name).copied().unwrap_or(false)
    }
}

/// Feature flags a fresh state starts with.
pub fn default_features() -> BTreeMap<String, bool> {
    [
        ("real_time_overlay", false),
        ("smart_area_detection", false),
        ("batch_processing", true),
        ("voice_commands", false),
        ("cloud_sync", false),
    ]
    .into_iter()
    .map(|(name, enabled)| (name.to_string(), enabled))
    .collect()
}

/// User preferences a fresh state starts with.
pub fn default_preferences() -> BTreeMap<String, Value> {
    [
        ("auto_copy_to_clipboard", true),
        ("show_confidence_scores", false),
        ("dark_mode", false),
        ("minimize_to_tray", true),
        ("auto_language_detection", true),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_string(), Value::Bool(value)))
    .collect()
}

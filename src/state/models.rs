//! Sub-states and value types that make up [`AppState`](super::AppState).

use crate::types::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Application lifecycle status.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    #[default]
    Initializing,
    Ready,
    Capturing,
    Processing,
    Error,
    ShuttingDown,
}

impl AppStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppStatus::Initializing => "initializing",
            AppStatus::Ready => "ready",
            AppStatus::Capturing => "capturing",
            AppStatus::Processing => "processing",
            AppStatus::Error => "error",
            AppStatus::ShuttingDown => "shutting_down",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Screen capture modes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    #[default]
    AreaSelect,
    CenterArea,
    BottomArea,
    FullScreen,
}

/// Screen rectangle selected for capture.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaptureArea {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureArea {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Severity of a toast notification.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

/// A completed translation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Translation {
    pub id: String,
    pub original_text: String,
    pub translated_text: String,
    pub source_language: String,
    pub target_language: String,
    pub timestamp: Timestamp,
    pub confidence: Option<f64>,
    pub cached: bool,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
}

impl Translation {
    /// New translation stamped with a fresh id and the current time.
    pub fn new(
        original_text: impl Into<String>,
        translated_text: impl Into<String>,
        source_language: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            original_text: original_text.into(),
            translated_text: translated_text.into(),
            source_language: source_language.into(),
            target_language: target_language.into(),
            timestamp: Timestamp::now(),
            confidence: None,
            cached: false,
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

/// Metadata of a captured screenshot (the image itself lives elsewhere).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotRecord {
    pub id: String,
    pub area: Option<CaptureArea>,
    pub width: u32,
    pub height: u32,
    pub captured_at: Timestamp,
    pub path: Option<String>,
}

/// Snapshot of the loaded application configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigSnapshot {
    pub values: BTreeMap<String, Value>,
}

impl ConfigSnapshot {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.values.insert(key.into(), value);
        self
    }
}

/// Last application-level error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppError {
    pub kind: String,
    pub message: String,
    pub occurred_at: Timestamp,
}

/// User interface state.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UiState {
    pub settings_window_open: bool,
    pub history_window_open: bool,
    pub overlay_visible: bool,
    pub progress_visible: bool,
    pub progress_message: String,
    /// Fraction in `0.0..=1.0`.
    pub progress_value: f64,
    pub progress_indeterminate: bool,
    pub toast_message: String,
    pub toast_visible: bool,
    pub toast_kind: ToastKind,
    pub toast_duration_ms: u64,
}

/// Current processing operation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessingState {
    pub is_processing: bool,
    /// "ocr", "translation", "tts", "batch".
    pub operation_type: String,
    pub current_step: String,
    /// Percentage in `0.0..=100.0`.
    pub progress_percentage: f64,
    pub started_at: Option<Timestamp>,
    pub estimated_completion: Option<Timestamp>,
}

/// Rolling performance counters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub avg_ocr_time_ms: f64,
    pub avg_translation_time_ms: f64,
    pub avg_total_time_ms: f64,
    pub success_rate: f64,
    pub total_operations: u64,
    pub failed_operations: u64,
    pub cache_hit_rate: f64,
    pub memory_usage_mb: f64,
    pub cpu_usage_percent: f64,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        Self {
            avg_ocr_time_ms: 0.0,
            avg_translation_time_ms: 0.0,
            avg_total_time_ms: 0.0,
            success_rate: 1.0,
            total_operations: 0,
            failed_operations: 0,
            cache_hit_rate: 0.0,
            memory_usage_mb: 0.0,
            cpu_usage_percent: 0.0,
        }
    }
}

/// Health of the external engines.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub ocr_service_healthy: bool,
    pub translation_service_healthy: bool,
    pub tts_service_healthy: bool,
    /// Circuit breaker state per service name ("closed", "open", "half_open").
    pub circuit_breaker_states: BTreeMap<String, String>,
    pub last_health_check: Option<Timestamp>,
}

impl Default for ServiceHealth {
    fn default() -> Self {
        Self {
            ocr_service_healthy: true,
            translation_service_healthy: true,
            tts_service_healthy: true,
            circuit_breaker_states: BTreeMap::new(),
            last_health_check: None,
        }
    }
}

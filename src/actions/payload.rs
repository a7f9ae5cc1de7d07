//! Typed payloads, one variant per discriminator.

use super::action_type::ActionType;
use crate::state::{
    CaptureArea, CaptureMode, ConfigSnapshot, ScreenshotRecord, ToastKind, Translation,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Which cache a cache action targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheKind {
    Ocr,
    Translation,
}

/// One performance sample reported by a producer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsSample {
    pub ocr_time_ms: Option<f64>,
    pub translation_time_ms: Option<f64>,
    pub total_time_ms: Option<f64>,
    pub success: bool,
    pub cache_hit: bool,
}

impl Default for MetricsSample {
    fn default() -> Self {
        Self {
            ocr_time_ms: None,
            translation_time_ms: None,
            total_time_ms: None,
            success: true,
            cache_hit: false,
        }
    }
}

/// Payload of an action.
///
/// The variant determines the discriminator, so an action can never carry a
/// payload that doesn't match its type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ActionPayload {
    #[serde(rename = "app/initialize")]
    AppInitialize { version: String },
    #[serde(rename = "app/ready")]
    AppReady,
    #[serde(rename = "app/shutdown")]
    AppShutdown,
    #[serde(rename = "app/error")]
    AppError { kind: String, message: String },

    #[serde(rename = "config/load")]
    ConfigLoad { config: ConfigSnapshot },
    #[serde(rename = "config/update")]
    ConfigUpdate { key: String, value: Value },
    #[serde(rename = "config/reset")]
    ConfigReset,

    #[serde(rename = "language/change")]
    LanguageChange { target_language: String },
    #[serde(rename = "language/list_update")]
    LanguageListUpdate { languages: Vec<String> },
    #[serde(rename = "translation/start")]
    TranslationStart {
        original_text: String,
        target_language: String,
    },
    #[serde(rename = "translation/success")]
    TranslationSuccess {
        translation: Translation,
        execution_time_ms: f64,
    },
    #[serde(rename = "translation/failure")]
    TranslationFailure {
        error_message: String,
        original_text: String,
    },
    #[serde(rename = "translation/history_add")]
    TranslationHistoryAdd { translation: Translation },
    #[serde(rename = "translation/history_clear")]
    TranslationHistoryClear,

    #[serde(rename = "capture/mode_change")]
    CaptureModeChange { mode: CaptureMode },
    #[serde(rename = "capture/start")]
    CaptureStart,
    #[serde(rename = "capture/success")]
    CaptureSuccess { screenshot: ScreenshotRecord },
    #[serde(rename = "capture/failure")]
    CaptureFailure { error_message: String },
    #[serde(rename = "capture/area_set")]
    CaptureAreaSet { area: CaptureArea },

    #[serde(rename = "ui/settings_open")]
    UiSettingsOpen,
    #[serde(rename = "ui/settings_close")]
    UiSettingsClose,
    #[serde(rename = "ui/history_open")]
    UiHistoryOpen,
    #[serde(rename = "ui/history_close")]
    UiHistoryClose,
    #[serde(rename = "ui/overlay_show")]
    UiOverlayShow,
    #[serde(rename = "ui/overlay_hide")]
    UiOverlayHide,
    #[serde(rename = "ui/progress_show")]
    UiProgressShow { message: String, indeterminate: bool },
    /// `value` is a fraction in `0.0..=1.0`; a missing message keeps the old one.
    #[serde(rename = "ui/progress_update")]
    UiProgressUpdate { value: f64, message: Option<String> },
    #[serde(rename = "ui/progress_hide")]
    UiProgressHide,
    #[serde(rename = "ui/toast_show")]
    UiToastShow {
        message: String,
        kind: ToastKind,
        duration_ms: u64,
    },
    #[serde(rename = "ui/toast_hide")]
    UiToastHide,

    #[serde(rename = "processing/start")]
    ProcessingStart {
        operation_type: String,
        estimated_duration_ms: Option<f64>,
    },
    /// `progress_percentage` is in `0.0..=100.0`.
    #[serde(rename = "processing/update")]
    ProcessingUpdate {
        current_step: String,
        progress_percentage: f64,
    },
    #[serde(rename = "processing/complete")]
    ProcessingComplete,
    #[serde(rename = "processing/error")]
    ProcessingError { message: String },

    #[serde(rename = "metrics/update")]
    MetricsUpdate(MetricsSample),
    #[serde(rename = "metrics/reset")]
    MetricsReset,

    #[serde(rename = "service/health_update")]
    ServiceHealthUpdate {
        service: String,
        healthy: bool,
        error_message: Option<String>,
    },
    #[serde(rename = "service/circuit_breaker_change")]
    CircuitBreakerStateChange { service: String, state: String },

    #[serde(rename = "cache/update")]
    CacheUpdate {
        cache: CacheKind,
        key: String,
        value: Value,
    },
    /// `None` clears every cache.
    #[serde(rename = "cache/clear")]
    CacheClear { cache: Option<CacheKind> },

    #[serde(rename = "feature/toggle")]
    FeatureToggle { name: String, enabled: bool },
    #[serde(rename = "feature/update")]
    FeatureUpdate { flags: BTreeMap<String, bool> },

    #[serde(rename = "preference/update")]
    PreferenceUpdate { name: String, value: Value },
    #[serde(rename = "preference/reset")]
    PreferenceReset,
}

impl ActionPayload {
    /// The discriminator for this payload.
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionPayload::AppInitialize { .. } => ActionType::AppInitialize,
            ActionPayload::AppReady => ActionType::AppReady,
            ActionPayload::AppShutdown => ActionType::AppShutdown,
            ActionPayload::AppError { .. } => ActionType::AppError,
            ActionPayload::ConfigLoad { .. } => ActionType::ConfigLoad,
            ActionPayload::ConfigUpdate { .. } => ActionType::ConfigUpdate,
            ActionPayload::ConfigReset => ActionType::ConfigReset,
            ActionPayload::LanguageChange { .. } => ActionType::LanguageChange,
            ActionPayload::LanguageListUpdate { .. } => ActionType::LanguageListUpdate,
            ActionPayload::TranslationStart { .. } => ActionType::TranslationStart,
            ActionPayload::TranslationSuccess { .. } => ActionType::TranslationSuccess,
            ActionPayload::TranslationFailure { .. } => ActionType::TranslationFailure,
            ActionPayload::TranslationHistoryAdd { .. } => ActionType::TranslationHistoryAdd,
            ActionPayload::TranslationHistoryClear => ActionType::TranslationHistoryClear,
            ActionPayload::CaptureModeChange { .. } => ActionType::CaptureModeChange,
            ActionPayload::CaptureStart => ActionType::CaptureStart,
            ActionPayload::CaptureSuccess { .. } => ActionType::CaptureSuccess,
            ActionPayload::CaptureFailure { .. } => ActionType::CaptureFailure,
            ActionPayload::CaptureAreaSet { .. } => ActionType::CaptureAreaSet,
            ActionPayload::UiSettingsOpen => ActionType::UiSettingsOpen,
            ActionPayload::UiSettingsClose => ActionType::UiSettingsClose,
            ActionPayload::UiHistoryOpen => ActionType::UiHistoryOpen,
            ActionPayload::UiHistoryClose => ActionType::UiHistoryClose,
            ActionPayload::UiOverlayShow => ActionType::UiOverlayShow,
            ActionPayload::UiOverlayHide => ActionType::UiOverlayHide,
            ActionPayload::UiProgressShow { .. } => ActionType::UiProgressShow,
            ActionPayload::UiProgressUpdate { .. } => ActionType::UiProgressUpdate,
            ActionPayload::UiProgressHide => ActionType::UiProgressHide,
            ActionPayload::UiToastShow { .. } => ActionType::UiToastShow,
            ActionPayload::UiToastHide => ActionType::UiToastHide,
            ActionPayload::ProcessingStart { .. } => ActionType::ProcessingStart,
            ActionPayload::ProcessingUpdate { .. } => ActionType::ProcessingUpdate,
            ActionPayload::ProcessingComplete => ActionType::ProcessingComplete,
            ActionPayload::ProcessingError { .. } => ActionType::ProcessingError,
            ActionPayload::MetricsUpdate(_) => ActionType::MetricsUpdate,
            ActionPayload::MetricsReset => ActionType::MetricsReset,
            ActionPayload::ServiceHealthUpdate { .. } => ActionType::ServiceHealthUpdate,
            ActionPayload::CircuitBreakerStateChange { .. } => {
                ActionType::CircuitBreakerStateChange
            }
            ActionPayload::CacheUpdate { .. } => ActionType::CacheUpdate,
            ActionPayload::CacheClear { .. } => ActionType::CacheClear,
            ActionPayload::FeatureToggle { .. } => ActionType::FeatureToggle,
            ActionPayload::FeatureUpdate { .. } => ActionType::FeatureUpdate,
            ActionPayload::PreferenceUpdate { .. } => ActionType::PreferenceUpdate,
            ActionPayload::PreferenceReset => ActionType::PreferenceReset,
        }
    }
}

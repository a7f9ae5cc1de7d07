//! The closed set of action discriminators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! action_types {
    ($($variant:ident => $wire:literal, $name:literal;)+) => {
        /// Discriminator carried by every action.
        ///
        /// Each discriminator has a wire name (`"app/ready"`) used in
        /// serialized payloads and logs, and a constant-style name
        /// (`"APP_READY"`).
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum ActionType {
            $(
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl ActionType {
            /// Every discriminator, in declaration order.
            pub const ALL: &'static [ActionType] = &[$(ActionType::$variant,)+];

            /// Wire name, e.g. `app/ready`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ActionType::$variant => $wire,)+
                }
            }

            /// Constant-style name, e.g. `APP_READY`.
            pub fn name(&self) -> &'static str {
                match self {
                    $(ActionType::$variant => $name,)+
                }
            }
        }

        impl FromStr for ActionType {
            type Err = UnknownActionType;

            /// Accepts either the wire name or the constant-style name.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire | $name => Ok(ActionType::$variant),)+
                    _ => Err(UnknownActionType(s.to_string())),
                }
            }
        }
    };
}

action_types! {
    // Application lifecycle
    AppInitialize => "app/initialize", "APP_INITIALIZE";
    AppReady => "app/ready", "APP_READY";
    AppShutdown => "app/shutdown", "APP_SHUTDOWN";
    AppError => "app/error", "APP_ERROR";

    // Configuration
    ConfigLoad => "config/load", "CONFIG_LOAD";
    ConfigUpdate => "config/update", "CONFIG_UPDATE";
    ConfigReset => "config/reset", "CONFIG_RESET";

    // Language and translation
    LanguageChange => "language/change", "LANGUAGE_CHANGE";
    LanguageListUpdate => "language/list_update", "LANGUAGE_LIST_UPDATE";
    TranslationStart => "translation/start", "TRANSLATION_START";
    TranslationSuccess => "translation/success", "TRANSLATION_SUCCESS";
    TranslationFailure => "translation/failure", "TRANSLATION_FAILURE";
    TranslationHistoryAdd => "translation/history_add", "TRANSLATION_HISTORY_ADD";
    TranslationHistoryClear => "translation/history_clear", "TRANSLATION_HISTORY_CLEAR";

    // Screen capture
    CaptureModeChange => "capture/mode_change", "CAPTURE_MODE_CHANGE";
    CaptureStart => "capture/start", "CAPTURE_START";
    CaptureSuccess => "capture/success", "CAPTURE_SUCCESS";
    CaptureFailure => "capture/failure", "CAPTURE_FAILURE";
    CaptureAreaSet => "capture/area_set", "CAPTURE_AREA_SET";

    // UI
    UiSettingsOpen => "ui/settings_open", "UI_SETTINGS_OPEN";
    UiSettingsClose => "ui/settings_close", "UI_SETTINGS_CLOSE";
    UiHistoryOpen => "ui/history_open", "UI_HISTORY_OPEN";
    UiHistoryClose => "ui/history_close", "UI_HISTORY_CLOSE";
    UiOverlayShow => "ui/overlay_show", "UI_OVERLAY_SHOW";
    UiOverlayHide => "ui/overlay_hide", "UI_OVERLAY_HIDE";
    UiProgressShow => "ui/progress_show", "UI_PROGRESS_SHOW";
    UiProgressUpdate => "ui/progress_update", "UI_PROGRESS_UPDATE";
    UiProgressHide => "ui/progress_hide", "UI_PROGRESS_HIDE";
    UiToastShow => "ui/toast_show", "UI_TOAST_SHOW";
    UiToastHide => "ui/toast_hide", "UI_TOAST_HIDE";

    // Processing
    ProcessingStart => "processing/start", "PROCESSING_START";
    ProcessingUpdate => "processing/update", "PROCESSING_UPDATE";
    ProcessingComplete => "processing/complete", "PROCESSING_COMPLETE";
    ProcessingError => "processing/error", "PROCESSING_ERROR";

    // Performance metrics
    MetricsUpdate => "metrics/update", "METRICS_UPDATE";
    MetricsReset => "metrics/reset", "METRICS_RESET";

    // Service health
    ServiceHealthUpdate => "service/health_update", "SERVICE_HEALTH_UPDATE";
    CircuitBreakerStateChange => "service/circuit_breaker_change", "CIRCUIT_BREAKER_STATE_CHANGE";

    // Caches
    CacheUpdate => "cache/update", "CACHE_UPDATE";
    CacheClear => "cache/clear", "CACHE_CLEAR";

    // Feature flags
    FeatureToggle => "feature/toggle", "FEATURE_TOGGLE";
    FeatureUpdate => "feature/update", "FEATURE_UPDATE";

    // User preferences
    PreferenceUpdate => "preference/update", "PREFERENCE_UPDATE";
    PreferenceReset => "preference/reset", "PREFERENCE_RESET";
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing a string that names no discriminator.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("Unknown action type: {0}")]
pub struct UnknownActionType(pub String);

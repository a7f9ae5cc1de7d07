//! The application's root reducer.

use super::{Reducer, Reduction};
use crate::actions::{Action, ActionPayload, CacheKind, MetricsSample};
use crate::error::ReducerError;
use crate::state::{
    default_preferences, AppError, AppState, AppStatus, ConfigSnapshot, PerformanceMetrics,
    ProcessingState,
};
use std::time::Duration;
use tracing::debug;

/// Limits applied by the root reducer.
#[derive(Clone, Debug)]
pub struct ReducerConfig {
    /// Max translations kept in `translation_history`.
    /// Default: 1000
    pub max_translation_history: usize,

    /// Max screenshot records kept in `screenshot_history`.
    /// Default: 50
    pub max_screenshot_history: usize,
}

impl Default for ReducerConfig {
    fn default() -> Self {
        Self {
            max_translation_history: 1000,
            max_screenshot_history: 50,
        }
    }
}

/// Reducer for the full action catalogue.
///
/// Dispatch is an exhaustive `match` over [`ActionPayload`], so a new
/// discriminator cannot be added without deciding how it reduces.
#[derive(Clone, Debug, Default)]
pub struct RootReducer {
    config: ReducerConfig,
}

impl RootReducer {
    pub fn new(config: ReducerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ReducerConfig {
        &self.config
    }
}

impl Reducer for RootReducer {
    fn reduce(&self, state: &AppState, action: &Action) -> Reduction {
        let mut next = state.clone();

        if !apply(&mut next, action, &self.config)? {
            debug!(action_type = %action.action_type(), "no reducer for action type");
            return Ok(None);
        }

        if next != *state {
            next.last_updated = action.created_at();
        }

        Ok(Some(next))
    }
}

/// Apply an action to `state` in place.
///
/// Returns `false` when the discriminator has no handler. `state` is a
/// private copy owned by the caller.
fn apply(state: &mut AppState, action: &Action, config: &ReducerConfig) -> Result<bool, ReducerError> {
    let at = action.created_at();

    match action.payload() {
        // --- Lifecycle ---
        ActionPayload::AppInitialize { version } => {
            state.status = AppStatus::Initializing;
            state.version = version.clone();
        }
        ActionPayload::AppReady => state.status = AppStatus::Ready,
        ActionPayload::AppShutdown => state.status = AppStatus::ShuttingDown,
        ActionPayload::AppError { kind, message } => {
            state.status = AppStatus::Error;
            state.last_error = Some(AppError {
                kind: kind.clone(),
                message: message.clone(),
                occurred_at: at,
            });
        }

        // --- Configuration ---
        ActionPayload::ConfigLoad { config } => state.config = Some(config.clone()),
        ActionPayload::ConfigUpdate { key, value } => {
            state
                .config
                .get_or_insert_with(ConfigSnapshot::default)
                .values
                .insert(key.clone(), value.clone());
        }
        ActionPayload::ConfigReset => state.config = None,

        // --- Language and translation ---
        ActionPayload::LanguageChange { target_language } => {
            if target_language.trim().is_empty() {
                return Err(invalid(action, "target language is empty"));
            }
            state.current_target_language = target_language.clone();
        }
        ActionPayload::LanguageListUpdate { languages } => {
            state.available_languages = languages.clone();
        }
        ActionPayload::TranslationSuccess { translation, .. } => {
            state.last_translation = Some(translation.clone());
        }
        ActionPayload::TranslationHistoryAdd { translation } => {
            state.translation_history.push(translation.clone());
            trim_front(&mut state.translation_history, config.max_translation_history);
        }
        ActionPayload::TranslationHistoryClear => state.translation_history.clear(),
        ActionPayload::TranslationStart { .. } | ActionPayload::TranslationFailure { .. } => {
            return Ok(false);
        }

        // --- Screen capture ---
        ActionPayload::CaptureModeChange { mode } => state.capture_mode = *mode,
        ActionPayload::CaptureAreaSet { area } => state.last_capture_area = Some(*area),
        ActionPayload::CaptureStart => state.status = AppStatus::Capturing,
        ActionPayload::CaptureSuccess { screenshot } => {
            state.screenshot_history.push(screenshot.clone());
            trim_front(&mut state.screenshot_history, config.max_screenshot_history);
            if state.status == AppStatus::Capturing {
                state.status = AppStatus::Ready;
            }
        }
        ActionPayload::CaptureFailure { error_message } => {
            state.status = AppStatus::Error;
            state.last_error = Some(AppError {
                kind: "capture".to_string(),
                message: error_message.clone(),
                occurred_at: at,
            });
        }

        // --- UI ---
        ActionPayload::UiSettingsOpen => state.ui.settings_window_open = true,
        ActionPayload::UiSettingsClose => state.ui.settings_window_open = false,
        ActionPayload::UiHistoryOpen => state.ui.history_window_open = true,
        ActionPayload::UiHistoryClose => state.ui.history_window_open = false,
        ActionPayload::UiOverlayShow => state.ui.overlay_visible = true,
        ActionPayload::UiOverlayHide => state.ui.overlay_visible = false,
        ActionPayload::UiProgressShow {
            message,
            indeterminate,
        } => {
            state.ui.progress_visible = true;
            state.ui.progress_message = message.clone();
            state.ui.progress_value = 0.0;
            state.ui.progress_indeterminate = *indeterminate;
        }
        ActionPayload::UiProgressUpdate { value, message } => {
            if !value.is_finite() || !(0.0..=1.0).contains(value) {
                return Err(invalid(action, format!("progress value {} outside 0..=1", value)));
            }
            state.ui.progress_value = *value;
            if let Some(message) = message {
                state.ui.progress_message = message.clone();
            }
        }
        ActionPayload::UiProgressHide => {
            state.ui.progress_visible = false;
            state.ui.progress_message.clear();
            state.ui.progress_value = 0.0;
            state.ui.progress_indeterminate = false;
        }
        ActionPayload::UiToastShow {
            message,
            kind,
            duration_ms,
        } => {
            state.ui.toast_visible = true;
            state.ui.toast_message = message.clone();
            state.ui.toast_kind = *kind;
            state.ui.toast_duration_ms = *duration_ms;
        }
        ActionPayload::UiToastHide => {
            state.ui.toast_visible = false;
            state.ui.toast_message.clear();
        }

        // --- Processing ---
        ActionPayload::ProcessingStart {
            operation_type,
            estimated_duration_ms,
        } => {
            let estimated_completion = match estimated_duration_ms {
                Some(ms) => match Duration::try_from_secs_f64(ms / 1000.0) {
                    Ok(duration) => Some(at.saturating_add(duration)),
                    Err(_) => {
                        return Err(invalid(action, format!("estimated duration {} ms", ms)));
                    }
                },
                None => None,
            };
            state.processing = ProcessingState {
                is_processing: true,
                operation_type: operation_type.clone(),
                current_step: "Starting...".to_string(),
                progress_percentage: 0.0,
                started_at: Some(at),
                estimated_completion,
            };
        }
        ActionPayload::ProcessingUpdate {
            current_step,
            progress_percentage,
        } => {
            if !progress_percentage.is_finite() || !(0.0..=100.0).contains(progress_percentage) {
                return Err(invalid(
                    action,
                    format!("progress percentage {} outside 0..=100", progress_percentage),
                ));
            }
            state.processing.current_step = current_step.clone();
            state.processing.progress_percentage = *progress_percentage;
        }
        ActionPayload::ProcessingComplete => {
            state.processing = ProcessingState {
                progress_percentage: 100.0,
                ..ProcessingState::default()
            };
        }
        ActionPayload::ProcessingError { .. } => {
            state.processing = ProcessingState {
                current_step: "Error occurred".to_string(),
                progress_percentage: state.processing.progress_percentage,
                ..ProcessingState::default()
            };
        }

        // --- Metrics ---
        ActionPayload::MetricsUpdate(sample) => apply_metrics_sample(state, sample, action)?,
        ActionPayload::MetricsReset => state.performance = PerformanceMetrics::default(),

        // --- Service health ---
        ActionPayload::ServiceHealthUpdate {
            service, healthy, ..
        } => {
            let flag = match service.as_str() {
                "ocr" => &mut state.service_health.ocr_service_healthy,
                "translation" => &mut state.service_health.translation_service_healthy,
                "tts" => &mut state.service_health.tts_service_healthy,
                other => {
                    debug!(service = other, "ignoring health update for unknown service");
                    return Ok(true);
                }
            };
            *flag = *healthy;
            state.service_health.last_health_check = Some(at);
        }
        ActionPayload::CircuitBreakerStateChange { service, state: breaker } => {
            state
                .service_health
                .circuit_breaker_states
                .insert(service.clone(), breaker.clone());
        }

        // --- Caches ---
        ActionPayload::CacheUpdate { cache, key, value } => {
            let target = match cache {
                CacheKind::Ocr => &mut state.ocr_cache,
                CacheKind::Translation => &mut state.translation_cache,
            };
            target.insert(key.clone(), value.clone());
        }
        ActionPayload::CacheClear { cache } => match cache {
            Some(CacheKind::Ocr) => state.ocr_cache.clear(),
            Some(CacheKind::Translation) => state.translation_cache.clear(),
            None => {
                state.ocr_cache.clear();
                state.translation_cache.clear();
            }
        },

        // --- Feature flags ---
        ActionPayload::FeatureToggle { name, enabled } => {
            if !name.is_empty() {
                state.features.insert(name.clone(), *enabled);
            }
        }
        ActionPayload::FeatureUpdate { flags } => {
            state
                .features
                .extend(flags.iter().map(|(name, enabled)| (name.clone(), *enabled)));
        }

        // --- Preferences ---
        ActionPayload::PreferenceUpdate { name, value } => {
            if !name.is_empty() {
                state.preferences.insert(name.clone(), value.clone());
            }
        }
        ActionPayload::PreferenceReset => state.preferences = default_preferences(),
    }

    Ok(true)
}

/// Fold one sample into the running averages.
fn apply_metrics_sample(
    state: &mut AppState,
    sample: &MetricsSample,
    action: &Action,
) -> Result<(), ReducerError> {
    for timing in [sample.ocr_time_ms, sample.translation_time_ms, sample.total_time_ms]
        .into_iter()
        .flatten()
    {
        if !timing.is_finite() || timing < 0.0 {
            return Err(invalid(action, format!("invalid timing {} ms", timing)));
        }
    }

    let perf = &mut state.performance;
    let n = perf.total_operations as f64;
    let running = |avg: f64, value: f64| (avg * n + value) / (n + 1.0);

    if let Some(ms) = sample.ocr_time_ms {
        perf.avg_ocr_time_ms = running(perf.avg_ocr_time_ms, ms);
    }
    if let Some(ms) = sample.translation_time_ms {
        perf.avg_translation_time_ms = running(perf.avg_translation_time_ms, ms);
    }
    if let Some(ms) = sample.total_time_ms {
        perf.avg_total_time_ms = running(perf.avg_total_time_ms, ms);
    }

    perf.total_operations += 1;
    if !sample.success {
        perf.failed_operations += 1;
    }
    perf.success_rate =
        (perf.total_operations - perf.failed_operations) as f64 / perf.total_operations as f64;

    if sample.cache_hit {
        perf.cache_hit_rate = (perf.cache_hit_rate + 0.01).min(1.0);
    }

    Ok(())
}

fn trim_front<T>(items: &mut Vec<T>, max: usize) {
    if items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}

fn invalid(action: &Action, reason: impl Into<String>) -> ReducerError {
    ReducerError::InvalidPayload {
        action_type: action.action_type(),
        reason: reason.into(),
    }
}

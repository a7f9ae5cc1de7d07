//! The immutable action envelope.

use super::action_type::ActionType;
use super::payload::ActionPayload;
use crate::state::Translation;
use crate::types::{ActionId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A request to change state.
///
/// Fields are fixed at construction. The `with_*` builders consume the
/// action and return a new one; middleware uses them to hand a transformed
/// action down the pipeline.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Action {
    id: ActionId,
    created_at: Timestamp,
    origin_user: Option<String>,
    #[serde(default)]
    extra: BTreeMap<String, Value>,
    #[serde(flatten)]
    payload: ActionPayload,
}

impl Action {
    /// New action with a fresh id, stamped with the current time.
    pub fn new(payload: ActionPayload) -> Self {
        Self {
            id: ActionId::generate(),
            created_at: Timestamp::now(),
            origin_user: None,
            extra: BTreeMap::new(),
            payload,
        }
    }

    pub fn id(&self) -> &ActionId {
        &self.id
    }

    pub fn action_type(&self) -> ActionType {
        self.payload.action_type()
    }

    pub fn payload(&self) -> &ActionPayload {
        &self.payload
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn origin_user(&self) -> Option<&str> {
        self.origin_user.as_deref()
    }

    pub fn extra(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn extra_value(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn with_origin_user(mut self, user: impl Into<String>) -> Self {
        self.origin_user = Some(user.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Override the creation time (replaying recorded actions, tests).
    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    // --- Constructors for common actions ---

    pub fn app_initialize(version: impl Into<String>) -> Self {
        Self::new(ActionPayload::AppInitialize {
            version: version.into(),
        })
    }

    pub fn app_ready() -> Self {
        Self::new(ActionPayload::AppReady)
    }

    pub fn app_shutdown() -> Self {
        Self::new(ActionPayload::AppShutdown)
    }

    pub fn app_error(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ActionPayload::AppError {
            kind: kind.into(),
            message: message.into(),
        })
    }

    pub fn language_change(target_language: impl Into<String>) -> Self {
        Self::new(ActionPayload::LanguageChange {
            target_language: target_language.into(),
        })
    }

    pub fn translation_success(translation: Translation, execution_time_ms: f64) -> Self {
        Self::new(ActionPayload::TranslationSuccess {
            translation,
            execution_time_ms,
        })
    }

    pub fn translation_failure(
        error_message: impl Into<String>,
        original_text: impl Into<String>,
    ) -> Self {
        Self::new(ActionPayload::TranslationFailure {
            error_message: error_message.into(),
            original_text: original_text.into(),
        })
    }

    pub fn processing_start(operation_type: impl Into<String>) -> Self {
        Self::new(ActionPayload::ProcessingStart {
            operation_type: operation_type.into(),
            estimated_duration_ms: None,
        })
    }

    pub fn feature_toggle(name: impl Into<String>, enabled: bool) -> Self {
        Self::new(ActionPayload::FeatureToggle {
            name: name.into(),
            enabled,
        })
    }

    pub fn preference_update(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(ActionPayload::PreferenceUpdate {
            name: name.into(),
            value: value.into(),
        })
    }
}

impl From<ActionPayload> for Action {
    fn from(payload: ActionPayload) -> Self {
        Action::new(payload)
    }
}

use super::{Middleware, Veto};
use crate::actions::{Action, ActionType};
use crate::error::{MiddlewareError, ValidationError};
use crate::state::{AppState, AppStatus};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tracing::warn;

const MAX_RECENT_ERRORS: usize = 100;
const TRANSLATION_HISTORY_WARN: usize = 10_000;

/// Counters kept by [`ValidationMiddleware`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationStats {
    pub blocked_count: u64,
    pub error_count: u64,
    /// Most recent validation errors, oldest first.
    pub recent_errors: Vec<ValidationError>,
}

#[derive(Default)]
struct Inner {
    blocked_count: u64,
    error_count: u64,
    recent: VecDeque<ValidationError>,
}

/// Rejects actions that make no sense in the current state and checks the
/// result of every committed mutation.
#[derive(Default)]
pub struct ValidationMiddleware {
    inner: Mutex<Inner>,
}

impl ValidationMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ValidationStats {
        let inner = self.inner.lock();
        ValidationStats {
            blocked_count: inner.blocked_count,
            error_count: inner.error_count,
            recent_errors: inner.recent.iter().cloned().collect(),
        }
    }

    fn push_error(inner: &mut Inner, err: ValidationError) {
        inner.error_count += 1;
        if inner.recent.len() >= MAX_RECENT_ERRORS {
            inner.recent.pop_front();
        }
        inner.recent.push_back(err);
    }

    fn check_action(action: &Action, state: &AppState) -> Result<(), ValidationError> {
        let action_type = action.action_type();

        if state.status == AppStatus::ShuttingDown
            && matches!(
                action_type,
                ActionType::TranslationStart | ActionType::CaptureStart | ActionType::ProcessingStart
            )
        {
            return Err(ValidationError::new(format!(
                "cannot start {} while shutting down",
                action_type.name()
            )));
        }

        if action_type == ActionType::ProcessingStart && state.processing.is_processing {
            return Err(ValidationError::new(format!(
                "processing already active ({})",
                state.processing.operation_type
            )));
        }

        Ok(())
    }

    fn check_state(state: &AppState) -> Result<(), ValidationError> {
        if state.processing.is_processing && state.processing.operation_type.is_empty() {
            return Err(ValidationError::new(
                "processing is active but no operation type is set",
            ));
        }

        let rate = state.performance.success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ValidationError::new(format!("success rate {} outside 0..=1", rate)));
        }

        Ok(())
    }
}

impl Middleware for ValidationMiddleware {
    fn name(&self) -> &str {
        "validation"
    }

    fn before_dispatch(&self, action: Action, state: &AppState) -> Result<Action, Veto> {
        match Self::check_action(&action, state) {
            Ok(()) => Ok(action),
            Err(err) => {
                warn!(action_type = %action.action_type(), reason = %err.message, "action blocked");
                let mut inner = self.inner.lock();
                inner.blocked_count += 1;
                Self::push_error(&mut inner, err.clone());
                Err(Veto::Invalid(err))
            }
        }
    }

    fn after_dispatch(
        &self,
        action: &Action,
        _old_state: &AppState,
        new_state: &AppState,
    ) -> Result<(), MiddlewareError> {
        if new_state.translation_history.len() > TRANSLATION_HISTORY_WARN {
            warn!(
                len = new_state.translation_history.len(),
                "translation history is very large"
            );
        }

        if let Err(err) = Self::check_state(new_state) {
            warn!(action_type = %action.action_type(), reason = %err.message, "inconsistent state");
            Self::push_error(&mut self.inner.lock(), err.clone());
            return Err(err.into());
        }
        Ok(())
    }
}

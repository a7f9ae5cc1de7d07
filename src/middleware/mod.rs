//! Middleware: hooks that run around every dispatch.
//!
//! Each middleware sees the action twice. `before_dispatch` runs before the
//! reducer and may pass the action through, hand back a transformed action,
//! or veto it. `after_dispatch` runs only for committed mutations, with the
//! old and new state. Both phases run in registration order.
//!
//! Hooks run while the store's dispatch guard is held. Reading the store
//! from a hook is fine; dispatching from one is rejected as reentrant.

mod devtools;
mod logging;
mod performance;
mod validation;

pub use devtools::{DevToolsConfig, DevToolsEntry, DevToolsMiddleware, DevToolsSnapshot};
pub use logging::{LogLevel, LoggingMiddleware};
pub use performance::{PerformanceConfig, PerformanceMiddleware, PerformanceSummary, SlowAction};
pub use validation::{ValidationMiddleware, ValidationStats};

use crate::actions::Action;
use crate::error::{MiddlewareError, ValidationError};
use crate::state::AppState;
use std::fmt;

/// Why a middleware stopped an action.
#[derive(Clone, Debug, PartialEq)]
pub enum Veto {
    /// Dropped, optionally with a human-readable reason.
    Blocked { reason: Option<String> },
    /// Rejected by a validation rule.
    Invalid(ValidationError),
}

impl Veto {
    pub fn blocked(reason: impl Into<String>) -> Self {
        Veto::Blocked {
            reason: Some(reason.into()),
        }
    }

    /// Veto without a reason.
    pub fn silent() -> Self {
        Veto::Blocked { reason: None }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Veto::Blocked { reason } => reason.as_deref(),
            Veto::Invalid(err) => Some(&err.message),
        }
    }
}

impl fmt::Display for Veto {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Veto::Blocked { reason: Some(reason) } => write!(f, "blocked: {}", reason),
            Veto::Blocked { reason: None } => f.write_str("blocked"),
            Veto::Invalid(err) => write!(f, "{}", err),
        }
    }
}

impl From<ValidationError> for Veto {
    fn from(err: ValidationError) -> Self {
        Veto::Invalid(err)
    }
}

/// A dispatch hook.
pub trait Middleware: Send + Sync {
    /// Name reported in logs and in [`DispatchOutcome::Blocked`](crate::DispatchOutcome::Blocked).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Inspect or transform the action before it reaches the reducer.
    ///
    /// `state` is the state at pipeline entry. Returning `Err` stops the
    /// dispatch; later middleware and the reducer are not called.
    fn before_dispatch(&self, action: Action, state: &AppState) -> Result<Action, Veto> {
        let _ = state;
        Ok(action)
    }

    /// Observe a committed mutation.
    fn after_dispatch(
        &self,
        action: &Action,
        old_state: &AppState,
        new_state: &AppState,
    ) -> Result<(), MiddlewareError> {
        let _ = (action, old_state, new_state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Passthrough;

    impl Middleware for Passthrough {}

    #[test]
    fn test_default_hooks_pass_through() {
        let mw = Passthrough;
        let action = Action::app_ready();
        let id = action.id().clone();
        let state = AppState::default();

        let out = mw.before_dispatch(action, &state).unwrap();
        assert_eq!(out.id(), &id);
        assert!(mw.after_dispatch(&out, &state, &state).is_ok());
        assert!(mw.name().ends_with("Passthrough"));
    }

    #[test]
    fn test_veto_display_and_reason() {
        assert_eq!(Veto::silent().to_string(), "blocked");
        assert_eq!(Veto::silent().reason(), None);
        assert_eq!(Veto::blocked("read only").to_string(), "blocked: read only");

        let veto: Veto = ValidationError::new("shutting down").into();
        assert_eq!(veto.reason(), Some("shutting down"));
        assert_eq!(veto.to_string(), "Validation failed: shutting down");
    }
}

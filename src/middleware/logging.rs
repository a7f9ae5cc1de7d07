use super::{Middleware, Veto};
use crate::actions::Action;
use crate::error::MiddlewareError;
use crate::state::AppState;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Level the logging middleware emits at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
}

/// Logs every action entering the pipeline and every status transition.
#[derive(Debug, Default)]
pub struct LoggingMiddleware {
    level: LogLevel,
    action_count: AtomicU64,
}

impl LoggingMiddleware {
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            action_count: AtomicU64::new(0),
        }
    }

    /// Actions seen by `before_dispatch`, including ones vetoed later.
    pub fn action_count(&self) -> u64 {
        self.action_count.load(Ordering::Relaxed)
    }
}

impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    fn before_dispatch(&self, action: Action, _state: &AppState) -> Result<Action, Veto> {
        let seq = self.action_count.fetch_add(1, Ordering::Relaxed) + 1;

        match self.level {
            LogLevel::Debug => debug!(
                seq,
                action_id = %action.id(),
                action_type = %action.action_type(),
                origin_user = action.origin_user().unwrap_or("-"),
                "dispatching action"
            ),
            LogLevel::Info => info!(
                seq,
                action_type = %action.action_type(),
                "dispatching action"
            ),
        }

        Ok(action)
    }

    fn after_dispatch(
        &self,
        action: &Action,
        old_state: &AppState,
        new_state: &AppState,
    ) -> Result<(), MiddlewareError> {
        if old_state.status != new_state.status {
            info!(
                action_type = %action.action_type(),
                from = %old_state.status,
                to = %new_state.status,
                "status changed"
            );
        } else if self.level == LogLevel::Debug {
            debug!(action_id = %action.id(), "state updated");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStatus;

    #[test]
    fn test_counts_actions() {
        let mw = LoggingMiddleware::new(LogLevel::Debug);
        let state = AppState::default();

        for _ in 0..3 {
            mw.before_dispatch(Action::app_ready(), &state).unwrap();
        }
        assert_eq!(mw.action_count(), 3);

        let ready = AppState::with_status(AppStatus::Ready);
        assert!(mw.after_dispatch(&Action::app_ready(), &state, &ready).is_ok());
    }
}

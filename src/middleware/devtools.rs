//! Action log and state pairs for debugging tools.

use super::{Middleware, Veto};
use crate::actions::{Action, ActionType};
use crate::error::{MiddlewareError, Result};
use crate::state::AppState;
use crate::types::{ActionId, StateDigest, Timestamp};
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::warn;

/// Configuration for [`DevToolsMiddleware`].
#[derive(Clone, Debug)]
pub struct DevToolsConfig {
    /// Max entries in the action log.
    /// Default: 1000
    pub max_log_entries: usize,

    /// Max before/after state pairs retained, least recently used evicted.
    /// Default: 100
    pub max_state_pairs: usize,
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            max_log_entries: 1000,
            max_state_pairs: 100,
        }
    }
}

/// One action as seen by the devtools log.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DevToolsEntry {
    pub action_id: ActionId,
    pub action_type: ActionType,
    pub created_at: Timestamp,
    /// Full action encoded as JSON.
    pub action: Value,
    /// Hex digest of the state the action was dispatched against.
    pub before: Option<String>,
    /// Hex digest of the committed state, if the action committed.
    pub after: Option<String>,
    pub changed: bool,
}

/// State before and after a committed action.
#[derive(Clone, Debug)]
pub struct DevToolsSnapshot {
    pub old_state: Arc<AppState>,
    pub new_state: Arc<AppState>,
}

#[derive(Serialize)]
struct DebugExport<'a> {
    action_count: usize,
    state_pair_count: usize,
    actions: &'a VecDeque<DevToolsEntry>,
}

struct Inner {
    log: VecDeque<DevToolsEntry>,
    pairs: LruCache<ActionId, DevToolsSnapshot>,
}

/// Records every action entering the pipeline and the state pairs of
/// committed ones.
pub struct DevToolsMiddleware {
    config: DevToolsConfig,
    inner: Mutex<Inner>,
}

impl DevToolsMiddleware {
    pub fn new(config: DevToolsConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_state_pairs).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                log: VecDeque::new(),
                pairs: LruCache::new(capacity),
            }),
            config,
        }
    }

    /// Action log, oldest first.
    pub fn action_log(&self) -> Vec<DevToolsEntry> {
        self.inner.lock().log.iter().cloned().collect()
    }

    pub fn state_pair(&self, action_id: &ActionId) -> Option<DevToolsSnapshot> {
        self.inner.lock().pairs.get(action_id).cloned()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.log.clear();
        inner.pairs.clear();
    }

    /// Action log as pretty-printed JSON.
    pub fn export_debug_data(&self) -> Result<String> {
        let inner = self.inner.lock();
        Ok(serde_json::to_string_pretty(&Self::export(&inner))?)
    }

    /// Action log as MessagePack.
    pub fn export_msgpack(&self) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        Ok(rmp_serde::to_vec_named(&Self::export(&inner))?)
    }

    fn export(inner: &Inner) -> DebugExport<'_> {
        DebugExport {
            action_count: inner.log.len(),
            state_pair_count: inner.pairs.len(),
            actions: &inner.log,
        }
    }

    fn digest(state: &AppState) -> Option<String> {
        StateDigest::of(state).ok().map(|d| d.to_hex())
    }
}

impl Default for DevToolsMiddleware {
    fn default() -> Self {
        Self::new(DevToolsConfig::default())
    }
}

impl Middleware for DevToolsMiddleware {
    fn name(&self) -> &str {
        "devtools"
    }

    fn before_dispatch(&self, action: Action, state: &AppState) -> std::result::Result<Action, Veto> {
        let encoded = serde_json::to_value(&action).unwrap_or_else(|e| {
            warn!(action_id = %action.id(), error = %e, "failed to encode action");
            Value::Null
        });

        let entry = DevToolsEntry {
            action_id: action.id().clone(),
            action_type: action.action_type(),
            created_at: action.created_at(),
            action: encoded,
            before: Self::digest(state),
            after: None,
            changed: false,
        };

        let mut inner = self.inner.lock();
        if inner.log.len() >= self.config.max_log_entries {
            inner.log.pop_front();
        }
        if self.config.max_log_entries > 0 {
            inner.log.push_back(entry);
        }

        Ok(action)
    }

    fn after_dispatch(
        &self,
        action: &Action,
        old_state: &AppState,
        new_state: &AppState,
    ) -> std::result::Result<(), MiddlewareError> {
        let after = Self::digest(new_state);

        let mut inner = self.inner.lock();
        if let Some(entry) = inner
            .log
            .iter_mut()
            .rev()
            .find(|e| &e.action_id == action.id())
        {
            entry.changed = entry.before != after;
            entry.after = after;
        }
        inner.pairs.put(
            action.id().clone(),
            DevToolsSnapshot {
                old_state: Arc::new(old_state.clone()),
                new_state: Arc::new(new_state.clone()),
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppStatus;

    #[test]
    fn test_logs_actions_and_pairs() {
        let mw = DevToolsMiddleware::default();
        let old = AppState::default();
        let new = AppState::with_status(AppStatus::Ready);

        let action = mw.before_dispatch(Action::app_ready(), &old).unwrap();
        mw.after_dispatch(&action, &old, &new).unwrap();

        let log = mw.action_log();
        assert_eq!(log.len(), 1);
        assert!(log[0].changed);
        assert_ne!(log[0].before, log[0].after);
        assert_eq!(log[0].action["type"], "app/ready");

        let pair = mw.state_pair(action.id()).unwrap();
        assert_eq!(pair.new_state.status, AppStatus::Ready);
    }

    #[test]
    fn test_vetoed_actions_stay_unchanged_in_log() {
        let mw = DevToolsMiddleware::default();
        let action = mw
            .before_dispatch(Action::app_shutdown(), &AppState::default())
            .unwrap();

        let log = mw.action_log();
        assert!(!log[0].changed);
        assert!(log[0].after.is_none());
        assert!(mw.state_pair(action.id()).is_none());
    }

    #[test]
    fn test_log_is_bounded() {
        let mw = DevToolsMiddleware::new(DevToolsConfig {
            max_log_entries: 5,
            max_state_pairs: 2,
        });
        let state = AppState::default();
        for _ in 0..8 {
            let action = mw.before_dispatch(Action::app_ready(), &state).unwrap();
            mw.after_dispatch(&action, &state, &state).unwrap();
        }
        assert_eq!(mw.action_log().len(), 5);
        assert_eq!(mw.inner.lock().pairs.len(), 2);
    }

    #[test]
    fn test_exports() {
        let mw = DevToolsMiddleware::default();
        mw.before_dispatch(Action::app_ready(), &AppState::default())
            .unwrap();

        let json: Value = serde_json::from_str(&mw.export_debug_data().unwrap()).unwrap();
        assert_eq!(json["action_count"], 1);
        assert_eq!(json["actions"][0]["action_type"], "app/ready");

        let packed = mw.export_msgpack().unwrap();
        assert!(!packed.is_empty());

        mw.clear();
        assert!(mw.action_log().is_empty());
    }
}

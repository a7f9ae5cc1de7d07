use crate::actions::ActionType;
use crate::state::AppState;
use crate::types::{ActionId, StateDigest, Timestamp};
use std::sync::Arc;
use std::time::Duration;

/// A committed state together with the action that produced it.
///
/// The state is immutable and shared with the store; callers get either a
/// reference or an owned copy.
#[derive(Clone, Debug)]
pub struct StateSnapshot {
    /// When the state was committed.
    pub captured_at: Timestamp,
    /// Action that produced this state; `None` for seeded and reset states.
    pub action_id: Option<ActionId>,
    pub discriminator: Option<ActionType>,
    state: Arc<AppState>,
}

impl StateSnapshot {
    pub(crate) fn new(
        state: Arc<AppState>,
        action_id: Option<ActionId>,
        discriminator: Option<ActionType>,
        captured_at: Timestamp,
    ) -> Self {
        Self {
            captured_at,
            action_id,
            discriminator,
            state,
        }
    }

    /// Snapshot not tied to any action (construction, reset, history clear).
    pub(crate) fn seed(state: Arc<AppState>) -> Self {
        Self::new(state, None, None, Timestamp::now())
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Owned copy of the state.
    pub fn to_state(&self) -> AppState {
        (*self.state).clone()
    }

    pub fn age(&self) -> Duration {
        self.captured_at.elapsed_until(Timestamp::now())
    }

    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.age() > max_age
    }

    pub fn digest(&self) -> Result<StateDigest, serde_json::Error> {
        StateDigest::of(self.state.as_ref())
    }
}

impl PartialEq for StateSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.captured_at == other.captured_at
            && self.action_id == other.action_id
            && self.discriminator == other.discriminator
            && self.state == other.state
    }
}

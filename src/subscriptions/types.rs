//! Subscription types.

use crate::actions::ActionType;
use crate::state::AppState;
use crate::types::ActionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use crate::store::{Store, StoreShared};
use std::sync::{Arc, Weak};

/// Callback invoked with the new state after every committed change.
pub type Subscriber = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Configuration for a channel-based watcher.
#[derive(Clone, Debug)]
pub struct WatchConfig {
    /// Max buffered events before the watcher is dropped.
    /// Default: 256
    pub buffer_size: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { buffer_size: 256 }
    }
}

/// Events delivered to watchers.
#[derive(Clone, Debug)]
pub enum StateEvent {
    /// A dispatch committed a new state.
    Changed {
        state: Arc<AppState>,
        action_id: ActionId,
        action_type: ActionType,
    },

    /// The state was replaced through `reset_state`.
    Reset { state: Arc<AppState> },

    /// The watcher was removed; no further events follow.
    Dropped { reason: DropReason },
}

impl StateEvent {
    pub fn state(&self) -> Option<&AppState> {
        match self {
            StateEvent::Changed { state, .. } | StateEvent::Reset { state } => Some(state),
            StateEvent::Dropped { .. } => None,
        }
    }
}

/// Why a watcher was dropped.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// Send buffer overflowed (slow consumer).
    BufferOverflow,
    /// Receiver was dropped.
    Disconnected,
    /// Explicitly unwatched.
    Unsubscribed,
}

/// Unique identifier for a subscriber or watcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Handle to a callback subscription.
///
/// Dropping the handle leaves the callback registered.
#[derive(Debug)]
pub struct SubscriptionHandle {
    id: SubscriptionId,
    store: Weak<StoreShared>,
}

impl SubscriptionHandle {
    pub(crate) fn new(id: SubscriptionId, store: Weak<StoreShared>) -> Self {
        Self { id, store }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Remove exactly this callback. False if it was already removed or the
    /// store is gone. Same blocking rules as [`Store::unsubscribe`].
    pub fn unsubscribe(&self) -> bool {
        self.store
            .upgrade()
            .map_or(false, |shared| Store::from_shared(shared).unsubscribe(self.id))
    }
}

/// Handle to a watcher.
pub struct WatchHandle {
    pub id: SubscriptionId,
    /// Channel to receive events.
    pub receiver: crossbeam_channel::Receiver<StateEvent>,
}

impl WatchHandle {
    /// Receive the next event (blocking).
    pub fn recv(&self) -> Result<StateEvent, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking).
    pub fn try_recv(&self) -> Result<StateEvent, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: std::time::Duration,
    ) -> Result<StateEvent, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

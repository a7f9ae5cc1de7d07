//! Registry of subscribers and watchers.

use crate::error::panic_message;
use crate::state::AppState;
use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

use super::types::{
    DropReason, StateEvent, Subscriber, SubscriptionId, WatchConfig, WatchHandle,
};

/// Internal watcher state.
struct Watcher {
    sender: Sender<StateEvent>,
}

impl Watcher {
    /// Try to send an event. `Err` carries the reason the watcher must go.
    fn try_send(&self, event: StateEvent) -> Result<(), DropReason> {
        match self.sender.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(DropReason::BufferOverflow),
            Err(TrySendError::Disconnected(_)) => Err(DropReason::Disconnected),
        }
    }
}

/// Holds callbacks and watchers, and fans out state changes to them.
///
/// Locks are never held while a callback runs, so callbacks may subscribe,
/// unsubscribe or read the store. The store serializes registration with
/// notification by calling in here under its own guard.
pub struct SubscriptionManager {
    /// Callbacks in registration order.
    subscribers: RwLock<BTreeMap<SubscriptionId, Subscriber>>,
    watchers: RwLock<BTreeMap<SubscriptionId, Watcher>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(BTreeMap::new()),
            watchers: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn next_id(&self) -> SubscriptionId {
        SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a callback.
    pub fn subscribe(&self, callback: Subscriber) -> SubscriptionId {
        let id = self.next_id();
        self.subscribers.write().insert(id, callback);
        debug!(subscription = %id, "subscriber added");
        id
    }

    /// Remove a callback. Unknown ids are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.write().remove(&id).is_some();
        if removed {
            debug!(subscription = %id, "subscriber removed");
        }
        removed
    }

    /// Register a channel-based watcher.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        let id = self.next_id();
        let (sender, receiver) = bounded(config.buffer_size.max(1));
        self.watchers.write().insert(id, Watcher { sender });
        WatchHandle { id, receiver }
    }

    /// Remove a watcher and tell it so (best effort).
    pub fn unwatch(&self, id: SubscriptionId) -> bool {
        let removed = self.watchers.write().remove(&id);
        match removed {
            Some(watcher) => {
                let _ = watcher.try_send(StateEvent::Dropped {
                    reason: DropReason::Unsubscribed,
                });
                true
            }
            None => false,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    pub fn watcher_count(&self) -> usize {
        self.watchers.read().len()
    }

    /// Deliver `state` to every callback and `event` to every watcher.
    ///
    /// Returns the number of callbacks that panicked. A panicking callback
    /// does not stop the others.
    pub fn notify(&self, state: &AppState, event: StateEvent) -> usize {
        let callbacks: Vec<(SubscriptionId, Subscriber)> = self
            .subscribers
            .read()
            .iter()
            .map(|(id, cb)| (*id, Arc::clone(cb)))
            .collect();

        let mut failures = 0;
        for (id, callback) in callbacks {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| callback(state))) {
                failures += 1;
                error!(
                    subscription = %id,
                    panic = %panic_message(payload.as_ref()),
                    "subscriber panicked"
                );
            }
        }

        self.broadcast(event);
        failures
    }

    /// Send to every watcher. Drops watchers that fail to receive.
    fn broadcast(&self, event: StateEvent) {
        let mut to_remove = Vec::new();

        {
            let watchers = self.watchers.read();
            for (id, watcher) in watchers.iter() {
                if let Err(reason) = watcher.try_send(event.clone()) {
                    to_remove.push((*id, reason));
                }
            }
        }

        if !to_remove.is_empty() {
            let mut watchers = self.watchers.write();
            for (id, reason) in to_remove {
                if let Some(watcher) = watchers.remove(&id) {
                    debug!(subscription = %id, ?reason, "watcher dropped");
                    // Might fail for a full buffer; the receiver sees the
                    // channel close once the sender is gone.
                    let _ = watcher.try_send(StateEvent::Dropped { reason });
                }
            }
        }
    }
}

impl Default for SubscriptionManager {
    fn default() -> Self {
        Self::new()
    }
}

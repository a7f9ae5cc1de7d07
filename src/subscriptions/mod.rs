//! Change notification for store consumers.
//!
//! Two flavours:
//! - Callbacks (`Fn(&AppState)`), invoked synchronously in registration
//!   order after every committed change.
//! - Watchers, bounded channels of [`StateEvent`]s for consumers on other
//!   threads. Slow watchers are dropped rather than slowing down dispatch.
//!
//! # Example
//!
//! ```ignore
//! let store = Store::new(AppState::default());
//!
//! let handle = store.watch(WatchConfig::default());
//! std::thread::spawn(move || loop {
//!     match handle.recv() {
//!         Ok(StateEvent::Changed { state, action_type, .. }) => {
//!             println!("{} -> {}", action_type, state.status)
//!         }
//!         Ok(StateEvent::Reset { .. }) => println!("state reset"),
//!         Ok(StateEvent::Dropped { .. }) | Err(_) => break,
//!     }
//! });
//! ```

mod manager;
mod types;

pub use manager::SubscriptionManager;
pub use types::{
    DropReason, StateEvent, Subscriber, SubscriptionHandle, SubscriptionId, WatchConfig,
    WatchHandle,
};

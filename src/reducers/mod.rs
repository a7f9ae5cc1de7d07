//! Reducers: pure functions from `(state, action)` to the next state.
//!
//! A reducer must not perform I/O, block, read the clock or mutate its
//! input. Anything time-dependent takes its time from
//! [`Action::created_at`](crate::Action::created_at), so reducing the same
//! pair twice always yields equal states.

mod root;

pub use root::{ReducerConfig, RootReducer};

use crate::actions::Action;
use crate::error::ReducerError;
use crate::state::AppState;

/// Outcome of a single reduction.
///
/// - `Ok(None)`: no handler for this discriminator; the store treats the
///   dispatch as a no-op.
/// - `Ok(Some(state))`: the next state. Returning a value equal to the
///   input signals "nothing changed".
/// - `Err(_)`: the reduction failed; the current state is kept.
pub type Reduction = Result<Option<AppState>, ReducerError>;

/// Computes the next state for an action.
pub trait Reducer: Send + Sync {
    fn reduce(&self, state: &AppState, action: &Action) -> Reduction;
}

impl<F> Reducer for F
where
    F: Fn(&AppState, &Action) -> Reduction + Send + Sync,
{
    fn reduce(&self, state: &AppState, action: &Action) -> Reduction {
        self(state, action)
    }
}

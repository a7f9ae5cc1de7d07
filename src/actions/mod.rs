//! Actions: immutable, typed requests to change state.
//!
//! An [`Action`] wraps an [`ActionPayload`] with metadata (unique id,
//! creation time, originating user, free-form extras). The payload variant
//! fixes the [`ActionType`] discriminator.

mod action;
mod action_type;
mod payload;

pub use action::Action;
pub use action_type::{ActionType, UnknownActionType};
pub use payload::{ActionPayload, CacheKind, MetricsSample};

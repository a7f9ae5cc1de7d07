//! Bounded history of committed states.

mod ring;
mod snapshot;

pub use ring::History;
pub use snapshot::StateSnapshot;

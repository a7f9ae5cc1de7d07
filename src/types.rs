//! Core types shared across the store.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }

    pub fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    pub fn as_micros(self) -> i64 {
        self.0
    }

    /// Absolute distance between two timestamps in microseconds.
    pub fn abs_diff(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }

    /// This timestamp moved forward by `duration`.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let micros = i64::try_from(duration.as_micros()).unwrap_or(i64::MAX);
        Timestamp(self.0.saturating_add(micros))
    }

    /// Time elapsed between `self` and `now`, zero if `self` is in the future.
    pub fn elapsed_until(self, now: Timestamp) -> Duration {
        Duration::from_micros(u64::try_from(now.0.saturating_sub(self.0)).unwrap_or(0))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Globally unique identifier of one action instance.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    /// Fresh random identifier.
    pub fn generate() -> Self {
        ActionId(format!("action_{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(s: &str) -> Self {
        ActionId(s.to_string())
    }
}

impl From<String> for ActionId {
    fn from(s: String) -> Self {
        ActionId(s)
    }
}

impl fmt::Debug for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActionId({})", self.0)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// SHA-256 digest of a serialized state.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDigest(pub [u8; 32]);

impl StateDigest {
    /// Compute digest from bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        StateDigest(hasher.finalize().into())
    }

    /// Digest of the canonical JSON encoding of a value.
    pub fn of<T: Serialize>(value: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::from_bytes(&serde_json::to_vec(value)?))
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StateDigest({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Store statistics returned by [`Store::get_metrics`](crate::Store::get_metrics).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct StoreMetrics {
    /// Dispatches that reached the pipeline (every outcome, not rejections).
    pub dispatch_count: u64,
    pub committed_count: u64,
    pub noop_count: u64,
    pub blocked_count: u64,
    /// Dispatches that failed inside the reducer.
    pub error_count: u64,
    /// Dispatches rejected as reentrant.
    pub rejected_count: u64,
    pub middleware_error_count: u64,
    pub subscriber_error_count: u64,
    pub total_dispatch_time: Duration,
    pub avg_dispatch_time_ms: f64,
    pub subscriber_count: usize,
    pub watcher_count: usize,
    pub middleware_count: usize,
    pub history_size: usize,
    pub history_capacity: usize,
    /// Rough size of the current state (JSON-encoded bytes).
    pub current_state_bytes: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_stable_hex() {
        let digest = StateDigest::from_bytes(b"hello world");
        assert_eq!(digest, StateDigest::from_bytes(b"hello world"));
        assert_ne!(digest, StateDigest::from_bytes(b"hello world!"));
        assert_eq!(digest.to_hex().len(), 64);
    }

    #[test]
    fn test_action_ids_are_unique() {
        let a = ActionId::generate();
        let b = ActionId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("action_"));
    }

    #[test]
    fn test_timestamp_arithmetic() {
        let t = Timestamp::from_micros(1_000);
        let later = t.saturating_add(Duration::from_millis(2));
        assert_eq!(later, Timestamp(3_000));
        assert_eq!(t.abs_diff(later), 2_000);
        assert_eq!(later.abs_diff(t), 2_000);
        assert_eq!(t.elapsed_until(later), Duration::from_millis(2));
        assert_eq!(later.elapsed_until(t), Duration::ZERO);
    }
}

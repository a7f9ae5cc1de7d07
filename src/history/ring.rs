use super::snapshot::StateSnapshot;
use crate::types::{ActionId, Timestamp};
use std::collections::VecDeque;

/// Fixed-capacity FIFO of snapshots, oldest first.
///
/// Never empty: it is created with a seed and every clear reseeds it.
#[derive(Debug)]
pub struct History {
    capacity: usize,
    entries: VecDeque<StateSnapshot>,
}

impl History {
    /// `capacity` is clamped to at least one.
    pub fn new(capacity: usize, seed: StateSnapshot) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(seed);
        Self { capacity, entries }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn latest(&self) -> Option<&StateSnapshot> {
        self.entries.back()
    }

    /// Append, evicting the oldest entry at capacity.
    pub fn push(&mut self, snapshot: StateSnapshot) {
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Drop everything and start over from `seed`.
    pub fn reseed(&mut self, seed: StateSnapshot) {
        self.entries.clear();
        self.entries.push_back(seed);
    }

    /// Up to `limit` most recent snapshots, most recent last.
    pub fn recent(&self, limit: usize) -> Vec<StateSnapshot> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.iter().skip(skip).cloned().collect()
    }

    /// Snapshot captured closest to `at`. Ties go to the earlier one.
    pub fn closest_to(&self, at: Timestamp) -> Option<StateSnapshot> {
        let mut best: Option<(&StateSnapshot, u64)> = None;
        for snapshot in &self.entries {
            let diff = snapshot.captured_at.abs_diff(at);
            if best.map_or(true, |(_, best_diff)| diff < best_diff) {
                best = Some((snapshot, diff));
            }
        }
        best.map(|(snapshot, _)| snapshot.clone())
    }

    /// Snapshot committed by `action_id`, if still retained.
    pub fn for_action(&self, action_id: &ActionId) -> Option<StateSnapshot> {
        self.entries
            .iter()
            .rev()
            .find(|s| s.action_id.as_ref() == Some(action_id))
            .cloned()
    }
}

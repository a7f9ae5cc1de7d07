use super::{Middleware, Veto};
use crate::actions::{Action, ActionType};
use crate::error::MiddlewareError;
use crate::state::AppState;
use crate::types::ActionId;
use lru::LruCache;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::warn;

/// Configuration for [`PerformanceMiddleware`].
#[derive(Clone, Debug)]
pub struct PerformanceConfig {
    /// Actions slower than this are recorded and logged.
    /// Default: 100ms
    pub slow_threshold: Duration,

    /// Max slow actions retained.
    /// Default: 50
    pub max_slow_actions: usize,

    /// Max in-flight timers. Timers for actions that never reach
    /// `after_dispatch` (vetoed, no-op, failed) are evicted oldest first.
    /// Default: 256
    pub max_pending: usize,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            slow_threshold: Duration::from_millis(100),
            max_slow_actions: 50,
            max_pending: 256,
        }
    }
}

/// An action that exceeded the slow threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct SlowAction {
    pub action_id: ActionId,
    pub action_type: ActionType,
    pub elapsed: Duration,
}

/// Aggregate timing of committed actions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceSummary {
    pub action_count: u64,
    pub total: Duration,
    pub average: Duration,
    pub slowest: Option<SlowAction>,
    pub slow_action_count: usize,
}

#[derive(Default)]
struct Totals {
    count: u64,
    total: Duration,
    slowest: Option<SlowAction>,
}

/// Measures the time between `before_dispatch` and `after_dispatch`.
pub struct PerformanceMiddleware {
    config: PerformanceConfig,
    pending: Mutex<LruCache<ActionId, Instant>>,
    slow: Mutex<VecDeque<SlowAction>>,
    totals: Mutex<Totals>,
}

impl PerformanceMiddleware {
    pub fn new(config: PerformanceConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_pending).unwrap_or(NonZeroUsize::MIN);
        Self {
            pending: Mutex::new(LruCache::new(capacity)),
            slow: Mutex::new(VecDeque::with_capacity(config.max_slow_actions)),
            totals: Mutex::new(Totals::default()),
            config,
        }
    }

    /// Slow actions, oldest first.
    pub fn slow_actions(&self) -> Vec<SlowAction> {
        self.slow.lock().iter().cloned().collect()
    }

    pub fn summary(&self) -> PerformanceSummary {
        let totals = self.totals.lock();
        let average = if totals.count == 0 {
            Duration::ZERO
        } else {
            totals.total / u32::try_from(totals.count).unwrap_or(u32::MAX)
        };
        PerformanceSummary {
            action_count: totals.count,
            total: totals.total,
            average,
            slowest: totals.slowest.clone(),
            slow_action_count: self.slow.lock().len(),
        }
    }

    /// Timers started but not yet finished.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn record(&self, action: &Action, elapsed: Duration) {
        let sample = SlowAction {
            action_id: action.id().clone(),
            action_type: action.action_type(),
            elapsed,
        };

        {
            let mut totals = self.totals.lock();
            totals.count += 1;
            totals.total += elapsed;
            if totals.slowest.as_ref().map_or(true, |s| elapsed > s.elapsed) {
                totals.slowest = Some(sample.clone());
            }
        }

        if elapsed > self.config.slow_threshold {
            warn!(
                action_type = %sample.action_type,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                "slow action"
            );
            let mut slow = self.slow.lock();
            if slow.len() >= self.config.max_slow_actions {
                slow.pop_front();
            }
            if self.config.max_slow_actions > 0 {
                slow.push_back(sample);
            }
        }
    }
}

impl Default for PerformanceMiddleware {
    fn default() -> Self {
        Self::new(PerformanceConfig::default())
    }
}

impl Middleware for PerformanceMiddleware {
    fn name(&self) -> &str {
        "performance"
    }

    fn before_dispatch(&self, action: Action, _state: &AppState) -> Result<Action, Veto> {
        self.pending.lock().put(action.id().clone(), Instant::now());
        Ok(action)
    }

    fn after_dispatch(
        &self,
        action: &Action,
        _old_state: &AppState,
        _new_state: &AppState,
    ) -> Result<(), MiddlewareError> {
        let started = self.pending.lock().pop(action.id());
        if let Some(started) = started {
            self.record(action, started.elapsed());
        }
        Ok(())
    }
}

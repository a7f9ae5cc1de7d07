//! Main Store struct tying all components together.

use crate::actions::Action;
use crate::dispatch::{DispatchOutcome, DispatchPhase, DispatchTicket};
use crate::error::{panic_message, ReducerError, Result, StoreError};
use crate::history::{History, StateSnapshot};
use crate::middleware::{Middleware, Veto};
use crate::reducers::{Reducer, RootReducer};
use crate::state::AppState;
use crate::subscriptions::{
    StateEvent, SubscriptionHandle, SubscriptionId, SubscriptionManager, WatchConfig, WatchHandle,
};
use crate::types::{ActionId, StoreMetrics, Timestamp};
use crossbeam_channel::bounded;
use parking_lot::ReentrantMutex;
use std::cell::RefCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Max snapshots kept in history. Must be at least 1.
    /// Default: 100
    pub history_capacity: usize,

    /// Dispatches slower than this are logged at warn level.
    /// Default: 100ms
    pub slow_dispatch_threshold: Duration,

    /// Name of the threads spawned by `dispatch_async`.
    /// Default: "statestore-dispatch"
    pub async_thread_name: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            slow_dispatch_threshold: Duration::from_millis(100),
            async_thread_name: "statestore-dispatch".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(StoreError::InvalidConfig(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.async_thread_name.is_empty() || self.async_thread_name.contains('\0') {
            return Err(StoreError::InvalidConfig(format!(
                "invalid async_thread_name {:?}",
                self.async_thread_name
            )));
        }
        Ok(())
    }
}

#[derive(Default)]
struct Counters {
    dispatch: u64,
    committed: u64,
    noop: u64,
    blocked: u64,
    error: u64,
    rejected: u64,
    middleware_error: u64,
    subscriber_error: u64,
    total_time: Duration,
}

impl Counters {
    fn record(&mut self, outcome: &DispatchOutcome, elapsed: Duration) {
        self.total_time += elapsed;
        match outcome {
            DispatchOutcome::Committed { .. } => self.committed += 1,
            DispatchOutcome::NoOp { .. } => self.noop += 1,
            DispatchOutcome::Blocked { .. } => self.blocked += 1,
            DispatchOutcome::Failed(_) => self.error += 1,
        }
    }
}

/// Data guarded by the store lock.
struct StoreInner {
    state: Arc<AppState>,
    history: History,
    middleware: Vec<Arc<dyn Middleware>>,
    counters: Counters,
    /// Set while a dispatch or reset is running on the lock-owning thread.
    dispatching: bool,
}

pub(crate) struct StoreShared {
    config: StoreConfig,
    reducer: Box<dyn Reducer>,
    /// Re-entrant so that hooks can read the store from the dispatching
    /// thread. Borrows never span a call into middleware, reducer or
    /// subscriber code.
    inner: ReentrantMutex<RefCell<StoreInner>>,
    subscriptions: Arc<SubscriptionManager>,
    phase: AtomicU8,
}

/// Clears the in-flight flag and the phase when a dispatch ends.
struct InFlight<'a> {
    inner: &'a RefCell<StoreInner>,
    phase: &'a AtomicU8,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.dispatching = false;
        }
        self.phase.store(DispatchPhase::Idle as u8, Ordering::Release);
    }
}

/// The application state store.
///
/// Owns the current [`AppState`], the reducer, the middleware pipeline, the
/// bounded history and the subscribers. All mutations go through
/// [`dispatch`](Store::dispatch) and are strictly serialized.
///
/// `Store` is a cheap handle: clone it into every component that needs it.
#[derive(Clone)]
pub struct Store {
    shared: Arc<StoreShared>,
}

impl Store {
    /// Store with the default configuration and the [`RootReducer`].
    pub fn new(initial: AppState) -> Self {
        Self::build(StoreConfig::default(), initial, Box::new(RootReducer::default()))
    }

    /// Store with a custom configuration and the [`RootReducer`].
    pub fn with_config(config: StoreConfig, initial: AppState) -> Result<Self> {
        Self::with_reducer(config, initial, RootReducer::default())
    }

    /// Store with a custom configuration and reducer.
    pub fn with_reducer(
        config: StoreConfig,
        initial: AppState,
        reducer: impl Reducer + 'static,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config, initial, Box::new(reducer)))
    }

    fn build(config: StoreConfig, initial: AppState, reducer: Box<dyn Reducer>) -> Self {
        let state = Arc::new(initial);
        let history = History::new(
            config.history_capacity,
            StateSnapshot::seed(Arc::clone(&state)),
        );

        info!(
            history_capacity = config.history_capacity,
            status = %state.status,
            "store initialized"
        );

        Self {
            shared: Arc::new(StoreShared {
                config,
                reducer,
                inner: ReentrantMutex::new(RefCell::new(StoreInner {
                    state,
                    history,
                    middleware: Vec::new(),
                    counters: Counters::default(),
                    dispatching: false,
                })),
                subscriptions: Arc::new(SubscriptionManager::new()),
                phase: AtomicU8::new(DispatchPhase::Idle as u8),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<StoreShared>) -> Self {
        Self { shared }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.shared.config
    }

    // --- Dispatch ---

    /// Run an action through the pipeline.
    ///
    /// Blocks while another thread is dispatching. Fails with
    /// [`StoreError::ReentrantDispatch`] when called from inside a dispatch
    /// on this store (from a middleware hook, the reducer or a subscriber);
    /// every other result is reported through the [`DispatchOutcome`].
    pub fn dispatch(&self, action: Action) -> Result<DispatchOutcome> {
        let guard = self.shared.inner.lock();
        let cell: &RefCell<StoreInner> = &guard;

        let (old_state, middleware) = {
            let mut inner = cell.borrow_mut();
            if inner.dispatching {
                inner.counters.rejected += 1;
                warn!(
                    action_type = %action.action_type(),
                    "reentrant dispatch rejected"
                );
                return Err(StoreError::reentrant(action.action_type().name()));
            }
            inner.dispatching = true;
            inner.counters.dispatch += 1;
            (Arc::clone(&inner.state), inner.middleware.clone())
        };
        let _in_flight = InFlight {
            inner: cell,
            phase: &self.shared.phase,
        };

        self.set_phase(DispatchPhase::Entering);
        let action_type = action.action_type();
        let started = Instant::now();

        let outcome = self.run_pipeline(cell, action, old_state, &middleware);

        let elapsed = started.elapsed();
        cell.borrow_mut().counters.record(&outcome, elapsed);

        if elapsed > self.shared.config.slow_dispatch_threshold {
            warn!(
                action_type = %action_type,
                elapsed_ms = elapsed.as_secs_f64() * 1000.0,
                outcome = %outcome,
                "slow dispatch"
            );
        }

        Ok(outcome)
    }

    /// Run [`dispatch`](Store::dispatch) on a dedicated thread.
    ///
    /// Returns immediately. Called from inside a dispatch on the same
    /// thread it is rejected right away rather than queued.
    ///
    /// Every call spawns a new OS thread and nothing bounds how many are
    /// alive at once; callers producing many actions should dispatch from
    /// their own worker instead. Outstanding calls commit in the order
    /// their threads win the store lock, so two async dispatches from the
    /// same producer may commit in either order. Wait on the first ticket
    /// before sending the second when order matters.
    pub fn dispatch_async(&self, action: Action) -> Result<DispatchTicket> {
        // Succeeds for the owning thread or when nobody holds the lock.
        if let Some(guard) = self.shared.inner.try_lock() {
            let mut inner = guard.borrow_mut();
            if inner.dispatching {
                inner.counters.rejected += 1;
                warn!(
                    action_type = %action.action_type(),
                    "reentrant async dispatch rejected"
                );
                return Err(StoreError::reentrant(action.action_type().name()));
            }
        }

        let (sender, receiver) = bounded(1);
        let action_id = action.id().clone();
        let store = self.clone();

        thread::Builder::new()
            .name(self.shared.config.async_thread_name.clone())
            .spawn(move || {
                let result = store.dispatch(action);
                // The ticket may have been dropped.
                let _ = sender.send(result);
            })?;

        Ok(DispatchTicket::new(action_id, receiver))
    }

    fn run_pipeline(
        &self,
        cell: &RefCell<StoreInner>,
        mut action: Action,
        old_state: Arc<AppState>,
        middleware: &[Arc<dyn Middleware>],
    ) -> DispatchOutcome {
        let entry_state: &AppState = &old_state;

        // Phase 1: before_dispatch, first veto wins.
        self.set_phase(DispatchPhase::MiddlewarePre);
        for mw in middleware {
            let action_type = action.action_type();
            let result = catch_unwind(AssertUnwindSafe(move || {
                mw.before_dispatch(action, entry_state)
            }));

            let veto = match result {
                Ok(Ok(next)) => {
                    action = next;
                    continue;
                }
                Ok(Err(veto)) => veto,
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    error!(
                        middleware = mw.name(),
                        action_type = %action_type,
                        panic = %message,
                        "middleware panicked in before_dispatch"
                    );
                    Veto::blocked(format!("middleware panicked: {}", message))
                }
            };

            info!(
                middleware = mw.name(),
                action_type = %action_type,
                veto = %veto,
                "action blocked"
            );
            self.set_phase(DispatchPhase::Aborted);
            return DispatchOutcome::Blocked {
                middleware: mw.name().to_string(),
                veto,
            };
        }

        // Phase 2: reduce.
        self.set_phase(DispatchPhase::Reducing);
        let reducer = &self.shared.reducer;
        let reduced = catch_unwind(AssertUnwindSafe(|| reducer.reduce(entry_state, &action)));

        let next = match reduced {
            Ok(Ok(Some(next))) => next,
            Ok(Ok(None)) => {
                debug!(action_type = %action.action_type(), "no reducer for action");
                return DispatchOutcome::NoOp { handled: false };
            }
            Ok(Err(err)) => return self.fail(&action, err),
            Err(payload) => {
                return self.fail(
                    &action,
                    ReducerError::Panicked(panic_message(payload.as_ref())),
                )
            }
        };

        if next == *entry_state {
            debug!(action_type = %action.action_type(), "state unchanged");
            return DispatchOutcome::NoOp { handled: true };
        }

        // Phase 3: commit.
        self.set_phase(DispatchPhase::Committing);
        let new_state = Arc::new(next);
        {
            let mut inner = cell.borrow_mut();
            inner.state = Arc::clone(&new_state);
            inner.history.push(StateSnapshot::new(
                Arc::clone(&new_state),
                Some(action.id().clone()),
                Some(action.action_type()),
                Timestamp::now(),
            ));
        }
        debug!(
            action_id = %action.id(),
            action_type = %action.action_type(),
            "action committed"
        );

        // Phase 4: after_dispatch. Failures never roll back.
        self.set_phase(DispatchPhase::MiddlewarePost);
        for mw in middleware {
            let result = catch_unwind(AssertUnwindSafe(|| {
                mw.after_dispatch(&action, entry_state, &new_state)
            }));
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    warn!(
                        middleware = mw.name(),
                        action_type = %action.action_type(),
                        error = %err,
                        "after_dispatch failed"
                    );
                    cell.borrow_mut().counters.middleware_error += 1;
                }
                Err(payload) => {
                    error!(
                        middleware = mw.name(),
                        action_type = %action.action_type(),
                        panic = %panic_message(payload.as_ref()),
                        "middleware panicked in after_dispatch"
                    );
                    cell.borrow_mut().counters.middleware_error += 1;
                }
            }
        }

        // Phase 5: notify.
        self.set_phase(DispatchPhase::Notifying);
        let failures = self.shared.subscriptions.notify(
            &new_state,
            StateEvent::Changed {
                state: Arc::clone(&new_state),
                action_id: action.id().clone(),
                action_type: action.action_type(),
            },
        );
        if failures > 0 {
            cell.borrow_mut().counters.subscriber_error += failures as u64;
        }

        DispatchOutcome::Committed {
            action_id: action.id().clone(),
            action_type: action.action_type(),
        }
    }

    fn fail(&self, action: &Action, err: ReducerError) -> DispatchOutcome {
        warn!(
            action_id = %action.id(),
            action_type = %action.action_type(),
            error = %err,
            "reducer failed"
        );
        self.set_phase(DispatchPhase::Failed);
        DispatchOutcome::Failed(err)
    }

    fn set_phase(&self, phase: DispatchPhase) {
        self.shared.phase.store(phase as u8, Ordering::Release);
    }

    /// Current pipeline phase. Does not take the store lock.
    pub fn phase(&self) -> DispatchPhase {
        DispatchPhase::from_u8(self.shared.phase.load(Ordering::Acquire))
    }

    // --- State ---

    /// Independent copy of the current state.
    pub fn get_state(&self) -> AppState {
        let state = {
            let guard = self.shared.inner.lock();
            let inner = guard.borrow();
            Arc::clone(&inner.state)
        };
        (*state).clone()
    }

    /// Replace the state (default state if `None`), reseed history and
    /// notify subscribers.
    ///
    /// Rejected with [`StoreError::ReentrantDispatch`] from inside a
    /// dispatch.
    pub fn reset_state(&self, new_state: Option<AppState>) -> Result<()> {
        let guard = self.shared.inner.lock();
        let cell: &RefCell<StoreInner> = &guard;

        let state = Arc::new(new_state.unwrap_or_default());
        {
            let mut inner = cell.borrow_mut();
            if inner.dispatching {
                inner.counters.rejected += 1;
                warn!("reset_state rejected during dispatch");
                return Err(StoreError::reentrant("reset_state"));
            }
            inner.dispatching = true;
            inner.state = Arc::clone(&state);
            inner.history.reseed(StateSnapshot::seed(Arc::clone(&state)));
        }
        let _in_flight = InFlight {
            inner: cell,
            phase: &self.shared.phase,
        };

        info!(status = %state.status, "state reset");

        self.set_phase(DispatchPhase::Notifying);
        let failures = self.shared.subscriptions.notify(
            &state,
            StateEvent::Reset {
                state: Arc::clone(&state),
            },
        );
        if failures > 0 {
            cell.borrow_mut().counters.subscriber_error += failures as u64;
        }
        Ok(())
    }

    // --- Middleware ---

    /// Append a middleware. Takes effect from the next dispatch.
    pub fn add_middleware(&self, middleware: Arc<dyn Middleware>) {
        debug!(middleware = middleware.name(), "middleware added");
        let guard = self.shared.inner.lock();
        guard.borrow_mut().middleware.push(middleware);
    }

    /// Remove a previously added middleware (matched by identity).
    pub fn remove_middleware<M: Middleware + ?Sized>(&self, middleware: &Arc<M>) -> bool {
        let target = Arc::as_ptr(middleware) as *const ();
        let guard = self.shared.inner.lock();
        let mut inner = guard.borrow_mut();
        let position = inner
            .middleware
            .iter()
            .position(|mw| Arc::as_ptr(mw) as *const () == target);
        match position {
            Some(index) => {
                inner.middleware.remove(index);
                true
            }
            None => false,
        }
    }

    // --- Subscriptions ---
    //
    // Registration takes the store guard, so from another thread it waits
    // for any running dispatch or reset to finish notifying. From inside a
    // callback the guard is re-entered.

    /// Register a callback for every committed change and every reset.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let _guard = self.shared.inner.lock();
        let id = self.shared.subscriptions.subscribe(Arc::new(callback));
        SubscriptionHandle::new(id, Arc::downgrade(&self.shared))
    }

    /// Remove a callback. Unknown ids are a no-op.
    ///
    /// Once this returns the callback is never invoked again.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let _guard = self.shared.inner.lock();
        self.shared.subscriptions.unsubscribe(id)
    }

    /// Open a bounded channel of state events.
    pub fn watch(&self, config: WatchConfig) -> WatchHandle {
        let _guard = self.shared.inner.lock();
        self.shared.subscriptions.watch(config)
    }

    pub fn unwatch(&self, id: SubscriptionId) -> bool {
        let _guard = self.shared.inner.lock();
        self.shared.subscriptions.unwatch(id)
    }

    // --- History ---

    /// Up to `limit` most recent snapshots, most recent last.
    pub fn get_history(&self, limit: usize) -> Vec<StateSnapshot> {
        let guard = self.shared.inner.lock();
        let inner = guard.borrow();
        inner.history.recent(limit)
    }

    /// Snapshot captured closest to `at`; ties go to the earlier one.
    pub fn get_state_at_time(&self, at: Timestamp) -> Option<StateSnapshot> {
        let guard = self.shared.inner.lock();
        let inner = guard.borrow();
        inner.history.closest_to(at)
    }

    /// Snapshot committed by `action_id`, if still in history.
    pub fn get_snapshot_for_action(&self, action_id: &ActionId) -> Option<StateSnapshot> {
        let guard = self.shared.inner.lock();
        let inner = guard.borrow();
        inner.history.for_action(action_id)
    }

    /// Drop all snapshots and keep one of the current state.
    pub fn clear_history(&self) {
        let guard = self.shared.inner.lock();
        let mut inner = guard.borrow_mut();
        let seed = StateSnapshot::seed(Arc::clone(&inner.state));
        inner.history.reseed(seed);
        debug!("history cleared");
    }

    // --- Metrics ---

    pub fn get_metrics(&self) -> StoreMetrics {
        let (mut metrics, state) = {
            let guard = self.shared.inner.lock();
            let inner = guard.borrow();
            let c = &inner.counters;
            let avg_dispatch_time_ms = if c.dispatch == 0 {
                0.0
            } else {
                c.total_time.as_secs_f64() * 1000.0 / c.dispatch as f64
            };
            let metrics = StoreMetrics {
                dispatch_count: c.dispatch,
                committed_count: c.committed,
                noop_count: c.noop,
                blocked_count: c.blocked,
                error_count: c.error,
                rejected_count: c.rejected,
                middleware_error_count: c.middleware_error,
                subscriber_error_count: c.subscriber_error,
                total_dispatch_time: c.total_time,
                avg_dispatch_time_ms,
                middleware_count: inner.middleware.len(),
                history_size: inner.history.len(),
                history_capacity: inner.history.capacity(),
                ..StoreMetrics::default()
            };
            (metrics, Arc::clone(&inner.state))
        };

        metrics.subscriber_count = self.shared.subscriptions.subscriber_count();
        metrics.watcher_count = self.shared.subscriptions.watcher_count();
        metrics.current_state_bytes = serde_json::to_vec(state.as_ref())
            .map(|bytes| bytes.len())
            .unwrap_or(0);
        metrics
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("config", &self.shared.config)
            .field("phase", &self.phase())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::ActionType;
    use crate::state::AppStatus;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_dispatch_commits_and_records_history() {
        let store = Store::new(AppState::default());

        let action = Action::app_ready();
        let id = action.id().clone();
        let outcome = store.dispatch(action).unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Committed {
                action_id: id.clone(),
                action_type: ActionType::AppReady
            }
        );
        assert_eq!(store.get_state().status, AppStatus::Ready);

        let history = store.get_history(10);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].action_id, None);
        assert_eq!(history[1].action_id, Some(id.clone()));
        assert_eq!(history[1].discriminator, Some(ActionType::AppReady));
        assert!(store.get_snapshot_for_action(&id).is_some());
        assert_eq!(store.phase(), DispatchPhase::Idle);
    }

    #[test]
    fn test_noop_when_unchanged_or_unhandled() {
        let store = Store::new(AppState::with_status(AppStatus::Ready));

        let outcome = store.dispatch(Action::app_ready()).unwrap();
        assert_eq!(outcome, DispatchOutcome::NoOp { handled: true });

        let outcome = store
            .dispatch(Action::translation_failure("timeout", "hola"))
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::NoOp { handled: false });

        assert_eq!(store.get_history(10).len(), 1);
        let metrics = store.get_metrics();
        assert_eq!(metrics.dispatch_count, 2);
        assert_eq!(metrics.noop_count, 2);
    }

    #[test]
    fn test_reentrant_dispatch_from_subscriber() {
        let store = Store::new(AppState::default());
        let inner = store.clone();
        let rejected = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&rejected);

        store.subscribe(move |_| {
            if let Err(StoreError::ReentrantDispatch { .. }) = inner.dispatch(Action::app_shutdown())
            {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            // Reads are fine from inside a notification.
            assert_eq!(inner.get_state().status, AppStatus::Ready);
        });

        assert!(store.dispatch(Action::app_ready()).unwrap().is_committed());
        assert_eq!(rejected.load(Ordering::SeqCst), 1);
        assert_eq!(store.get_state().status, AppStatus::Ready);
        assert_eq!(store.get_metrics().rejected_count, 1);
        assert_eq!(store.get_metrics().subscriber_error_count, 0);
    }

    #[test]
    fn test_reducer_failure_keeps_state() {
        let store = Store::with_reducer(
            StoreConfig::default(),
            AppState::default(),
            |_: &AppState, _: &Action| -> crate::reducers::Reduction {
                Err(ReducerError::Failed("engine offline".into()))
            },
        )
        .unwrap();

        let outcome = store.dispatch(Action::app_ready()).unwrap();
        assert_eq!(
            outcome,
            DispatchOutcome::Failed(ReducerError::Failed("engine offline".into()))
        );
        assert_eq!(store.get_state(), AppState::default());
        assert_eq!(store.get_metrics().error_count, 1);
    }

    #[test]
    fn test_reset_state_notifies_and_reseeds() {
        let store = Store::new(AppState::default());
        store.dispatch(Action::app_ready()).unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        store.subscribe(move |state| {
            assert_eq!(state.status, AppStatus::Processing);
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store
            .reset_state(Some(AppState::with_status(AppStatus::Processing)))
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let history = store.get_history(10);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].state().status, AppStatus::Processing);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = StoreConfig {
            history_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            Store::with_config(config, AppState::default()),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_metrics_report_sizes() {
        let store = Store::new(AppState::default());
        store.subscribe(|_| {});
        let _watch = store.watch(WatchConfig::default());
        store.add_middleware(Arc::new(crate::middleware::LoggingMiddleware::default()));

        let metrics = store.get_metrics();
        assert_eq!(metrics.subscriber_count, 1);
        assert_eq!(metrics.watcher_count, 1);
        assert_eq!(metrics.middleware_count, 1);
        assert_eq!(metrics.history_size, 1);
        assert_eq!(metrics.history_capacity, 100);
        assert!(metrics.current_state_bytes > 0);
    }
}

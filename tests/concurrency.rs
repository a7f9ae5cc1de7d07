//! Serialization and reentrancy under concurrent use.

use parking_lot::Mutex;
use statestore::state::AppStatus;
use statestore::{
    Action, AppState, DispatchOutcome, DispatchPhase, Middleware, MiddlewareError, Store,
    StoreConfig, StoreError, Veto,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Detects overlapping post-commit and notification phases.
struct OverlapDetector {
    active: AtomicBool,
    notifying: AtomicBool,
    overlaps: AtomicUsize,
}

impl OverlapDetector {
    fn on_notify(&self) {
        if self.notifying.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(1));
        self.notifying.store(false, Ordering::SeqCst);
    }
}

impl Middleware for OverlapDetector {
    fn after_dispatch(
        &self,
        _action: &Action,
        _old: &AppState,
        _new: &AppState,
    ) -> Result<(), MiddlewareError> {
        if self.active.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }
        thread::sleep(Duration::from_millis(1));
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_concurrent_dispatches_are_serialized() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 10;

    let store = Store::with_config(
        StoreConfig {
            history_capacity: THREADS * PER_THREAD + 1,
            ..Default::default()
        },
        AppState::default(),
    )
    .unwrap();
    let detector = Arc::new(OverlapDetector {
        active: AtomicBool::new(false),
        notifying: AtomicBool::new(false),
        overlaps: AtomicUsize::new(0),
    });
    store.add_middleware(detector.clone());
    let watcher = Arc::clone(&detector);
    store.subscribe(move |_| watcher.on_notify());

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let action = Action::feature_toggle(format!("flag-{}-{}", t, i), true);
                    assert!(store.dispatch(action).unwrap().is_committed());
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(detector.overlaps.load(Ordering::SeqCst), 0);

    // Seed plus one snapshot per commit, each containing everything before it.
    let history = store.get_history(usize::MAX);
    assert_eq!(history.len(), THREADS * PER_THREAD + 1);
    for pair in history.windows(2) {
        assert_eq!(pair[1].state().features.len(), pair[0].state().features.len() + 1);
    }

    let metrics = store.get_metrics();
    assert_eq!(metrics.committed_count, (THREADS * PER_THREAD) as u64);
    assert_eq!(store.phase(), DispatchPhase::Idle);
}

#[test]
fn test_reentrant_dispatch_from_middleware_is_rejected() {
    struct Echo {
        store: Mutex<Option<Store>>,
        result: Mutex<Option<Result<DispatchOutcome, String>>>,
    }

    impl Middleware for Echo {
        fn before_dispatch(&self, action: Action, _state: &AppState) -> Result<Action, Veto> {
            if let Some(store) = self.store.lock().as_ref() {
                let result = store
                    .dispatch(Action::app_shutdown())
                    .map_err(|e| e.to_string());
                *self.result.lock() = Some(result);
            }
            Ok(action)
        }
    }

    let store = Store::new(AppState::default());
    let echo = Arc::new(Echo {
        store: Mutex::new(Some(store.clone())),
        result: Mutex::new(None),
    });
    store.add_middleware(echo.clone());

    assert!(store.dispatch(Action::app_ready()).unwrap().is_committed());

    let nested = echo.result.lock().take().unwrap();
    assert!(nested.unwrap_err().contains("Reentrant dispatch rejected"));
    assert_eq!(store.get_state().status, AppStatus::Ready);
    assert_eq!(store.get_history(10).len(), 2);

    // Break the store -> middleware -> store cycle.
    echo.store.lock().take();
}

#[test]
fn test_reset_from_subscriber_is_rejected() {
    let store = Store::new(AppState::default());
    let inner = store.clone();
    let rejected = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&rejected);

    let handle = store.subscribe(move |_| {
        if let Err(StoreError::ReentrantDispatch { attempted }) = inner.reset_state(None) {
            assert_eq!(attempted, "reset_state");
            flag.store(true, Ordering::SeqCst);
        }
    });

    store.dispatch(Action::app_ready()).unwrap();
    handle.unsubscribe();

    assert!(rejected.load(Ordering::SeqCst));
    assert_eq!(store.get_state().status, AppStatus::Ready);
}

#[test]
fn test_dispatch_async_completes() {
    let store = Store::new(AppState::default());

    let ticket = store.dispatch_async(Action::app_ready()).unwrap();
    let outcome = ticket.wait().unwrap();

    assert!(outcome.is_committed());
    assert_eq!(store.get_state().status, AppStatus::Ready);
}

#[test]
fn test_dispatch_async_from_subscriber_is_rejected() {
    let store = Store::new(AppState::default());
    let inner = store.clone();
    let rejected = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&rejected);

    let handle = store.subscribe(move |_| {
        let result = inner.dispatch_async(Action::app_shutdown());
        flag.store(
            matches!(result, Err(StoreError::ReentrantDispatch { .. })),
            Ordering::SeqCst,
        );
    });

    store.dispatch(Action::app_ready()).unwrap();
    handle.unsubscribe();

    assert!(rejected.load(Ordering::SeqCst));
    // Nothing was queued behind the rejected call.
    thread::sleep(Duration::from_millis(20));
    assert_eq!(store.get_state().status, AppStatus::Ready);
}

#[test]
fn test_readers_block_until_dispatch_finishes() {
    struct Slow;

    impl Middleware for Slow {
        fn before_dispatch(&self, action: Action, _state: &AppState) -> Result<Action, Veto> {
            thread::sleep(Duration::from_millis(50));
            Ok(action)
        }
    }

    let store = Store::new(AppState::default());
    store.add_middleware(Arc::new(Slow));

    let ticket = store.dispatch_async(Action::app_ready()).unwrap();
    // Wait until the worker is inside the pipeline.
    let deadline = Instant::now() + Duration::from_secs(1);
    while store.phase() == DispatchPhase::Idle && Instant::now() < deadline {
        thread::yield_now();
    }

    // Either fully before or fully after the commit, never a torn state.
    let status = store.get_state().status;
    assert!(status == AppStatus::Initializing || status == AppStatus::Ready);

    assert!(ticket.wait().unwrap().is_committed());
    assert_eq!(store.get_state().status, AppStatus::Ready);
}

#[test]
fn test_unsubscribe_waits_for_running_notification() {
    let store = Store::new(AppState::default());
    let calls = Arc::new(AtomicUsize::new(0));

    store.subscribe(|_| thread::sleep(Duration::from_millis(100)));
    let counter = Arc::clone(&calls);
    let handle = store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    let ticket = store.dispatch_async(Action::app_ready()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(1);
    while store.phase() != DispatchPhase::Notifying && Instant::now() < deadline {
        thread::yield_now();
    }

    assert!(handle.unsubscribe());
    let calls_at_return = calls.load(Ordering::SeqCst);

    assert!(ticket.wait().unwrap().is_committed());
    store.dispatch(Action::app_shutdown()).unwrap();

    // Removed callbacks never run after unsubscribe returns.
    assert_eq!(calls.load(Ordering::SeqCst), calls_at_return);
    assert_eq!(store.get_metrics().subscriber_count, 1);
}

#[test]
fn test_subscribe_from_other_thread_during_dispatch() {
    let store = Store::new(AppState::default());
    store.subscribe(|_| thread::sleep(Duration::from_millis(50)));

    let ticket = store.dispatch_async(Action::app_ready()).unwrap();
    let deadline = Instant::now() + Duration::from_secs(1);
    while store.phase() == DispatchPhase::Idle && Instant::now() < deadline {
        thread::yield_now();
    }

    let late = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&late);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    // The dispatch already running was finished before registration.
    assert!(ticket.wait().unwrap().is_committed());
    assert_eq!(late.load(Ordering::SeqCst), 0);

    store.dispatch(Action::app_shutdown()).unwrap();
    assert_eq!(late.load(Ordering::SeqCst), 1);
}

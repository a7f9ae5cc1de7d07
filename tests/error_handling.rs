//! Error handling and edge case tests.

use statestore::state::AppStatus;
use statestore::{
    Action, ActionPayload, ActionType, AppState, DispatchOutcome, Middleware, MiddlewareError,
    Reduction, ReducerError, Store, StoreConfig, StoreError, Veto,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn panicking_reducer(state: &AppState, action: &Action) -> Reduction {
    if action.action_type() == ActionType::AppShutdown {
        panic!("reducer bug");
    }
    Ok(Some(AppState {
        status: AppStatus::Ready,
        ..state.clone()
    }))
}

// --- Reducer Errors ---

#[test]
fn test_invalid_payload_is_reported() {
    let store = Store::new(AppState::default());

    let outcome = store
        .dispatch(Action::new(ActionPayload::UiProgressUpdate {
            value: 7.0,
            message: None,
        }))
        .unwrap();

    assert!(matches!(
        outcome,
        DispatchOutcome::Failed(ReducerError::InvalidPayload {
            action_type: ActionType::UiProgressUpdate,
            ..
        })
    ));
    assert_eq!(store.get_state(), AppState::default());
    assert_eq!(store.get_history(10).len(), 1);
    assert_eq!(store.get_metrics().error_count, 1);
}

#[test]
fn test_reducer_panic_is_contained() {
    let store =
        Store::with_reducer(StoreConfig::default(), AppState::default(), panicking_reducer)
            .unwrap();

    let outcome = store.dispatch(Action::app_shutdown()).unwrap();
    assert_eq!(
        outcome,
        DispatchOutcome::Failed(ReducerError::Panicked("reducer bug".into()))
    );

    // The store keeps working afterwards.
    assert!(store.dispatch(Action::app_ready()).unwrap().is_committed());
    assert_eq!(store.get_state().status, AppStatus::Ready);
}

// --- Middleware Errors ---

#[test]
fn test_panic_in_before_dispatch_is_a_veto() {
    struct Exploding;

    impl Middleware for Exploding {
        fn name(&self) -> &str {
            "exploding"
        }

        fn before_dispatch(&self, _action: Action, _state: &AppState) -> Result<Action, Veto> {
            panic!("hook bug");
        }
    }

    let store = Store::new(AppState::default());
    store.add_middleware(Arc::new(Exploding));

    match store.dispatch(Action::app_ready()).unwrap() {
        DispatchOutcome::Blocked { middleware, veto } => {
            assert_eq!(middleware, "exploding");
            assert!(veto.reason().unwrap().contains("hook bug"));
        }
        other => panic!("Expected Blocked, got {:?}", other),
    }
    assert_eq!(store.get_state().status, AppStatus::Initializing);
}

#[test]
fn test_panic_in_after_dispatch_is_counted() {
    struct Exploding;

    impl Middleware for Exploding {
        fn after_dispatch(
            &self,
            _action: &Action,
            _old: &AppState,
            _new: &AppState,
        ) -> Result<(), MiddlewareError> {
            panic!("post hook bug");
        }
    }

    let store = Store::new(AppState::default());
    store.add_middleware(Arc::new(Exploding));

    assert!(store.dispatch(Action::app_ready()).unwrap().is_committed());
    assert_eq!(store.get_state().status, AppStatus::Ready);
    assert_eq!(store.get_metrics().middleware_error_count, 1);
}

// --- Subscriber Errors ---

#[test]
fn test_panicking_subscriber_does_not_starve_others() {
    let store = Store::new(AppState::default());
    let calls = Arc::new(AtomicUsize::new(0));

    store.subscribe(|_| panic!("subscriber bug"));
    let counter = Arc::clone(&calls);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    store.dispatch(Action::app_ready()).unwrap();
    store.dispatch(Action::app_shutdown()).unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.get_metrics().subscriber_error_count, 2);
    assert_eq!(store.get_state().status, AppStatus::ShuttingDown);
}

#[test]
fn test_unknown_unsubscribe_is_noop() {
    let store = Store::new(AppState::default());
    let handle = store.subscribe(|_| {});

    assert!(store.unsubscribe(handle.id()));
    assert!(!store.unsubscribe(handle.id()));
    assert!(!handle.unsubscribe());
}

// --- Configuration ---

#[test]
fn test_invalid_configs() {
    let zero = StoreConfig {
        history_capacity: 0,
        ..Default::default()
    };
    assert!(matches!(
        Store::with_config(zero, AppState::default()),
        Err(StoreError::InvalidConfig(_))
    ));

    let unnamed = StoreConfig {
        async_thread_name: String::new(),
        ..Default::default()
    };
    assert!(matches!(
        Store::with_config(unnamed, AppState::default()),
        Err(StoreError::InvalidConfig(_))
    ));
}

#[test]
fn test_capacity_one_keeps_latest_only() {
    let store = Store::with_config(
        StoreConfig {
            history_capacity: 1,
            ..Default::default()
        },
        AppState::default(),
    )
    .unwrap();

    store.dispatch(Action::app_ready()).unwrap();
    store.dispatch(Action::app_shutdown()).unwrap();

    let history = store.get_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].discriminator, Some(ActionType::AppShutdown));
}

#[test]
fn test_get_state_returns_independent_copy() {
    let store = Store::new(AppState::default());

    let mut copy = store.get_state();
    copy.status = AppStatus::Error;
    copy.features.clear();

    let fresh = store.get_state();
    assert_eq!(fresh.status, AppStatus::Initializing);
    assert!(!fresh.features.is_empty());
}

#[test]
fn test_unknown_action_type_name() {
    let parsed: Result<ActionType, _> = "NOT_A_REAL_ACTION".parse();
    assert!(parsed.is_err());
    assert_eq!("APP_READY".parse::<ActionType>().unwrap(), ActionType::AppReady);
    assert_eq!("app/ready".parse::<ActionType>().unwrap(), ActionType::AppReady);
}

//! History and time-travel tests.

use statestore::state::AppStatus;
use statestore::{Action, ActionType, AppState, Store, StoreConfig, Timestamp};
use std::thread;
use std::time::Duration;

fn store_with_capacity(capacity: usize) -> Store {
    Store::with_config(
        StoreConfig {
            history_capacity: capacity,
            ..Default::default()
        },
        AppState::default(),
    )
    .unwrap()
}

#[test]
fn test_new_store_has_seed_snapshot() {
    let store = Store::new(AppState::default());

    let history = store.get_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].action_id, None);
    assert_eq!(history[0].to_state(), AppState::default());
}

#[test]
fn test_history_keeps_last_commits() {
    let store = store_with_capacity(3);
    let mut ids = Vec::new();

    for lang in ["de", "fr", "ja", "ko", "es"] {
        let action = Action::language_change(lang);
        ids.push(action.id().clone());
        assert!(store.dispatch(action).unwrap().is_committed());
    }

    let history = store.get_history(3);
    let retained: Vec<_> = history.iter().map(|s| s.action_id.clone().unwrap()).collect();
    assert_eq!(retained, ids[2..].to_vec());
    assert_eq!(
        history
            .iter()
            .map(|s| s.state().current_target_language.as_str())
            .collect::<Vec<_>>(),
        vec!["ja", "ko", "es"]
    );

    // Asking for more than capacity returns what is there.
    assert_eq!(store.get_history(50).len(), 3);
    assert!(store.get_snapshot_for_action(&ids[0]).is_none());
    assert!(store.get_snapshot_for_action(&ids[4]).is_some());
}

#[test]
fn test_noop_and_blocked_do_not_record() {
    let store = Store::new(AppState::with_status(AppStatus::Ready));

    store.dispatch(Action::app_ready()).unwrap();
    store.dispatch(Action::translation_failure("timeout", "x")).unwrap();

    assert_eq!(store.get_history(10).len(), 1);
}

#[test]
fn test_state_at_time_finds_nearest() {
    let store = Store::new(AppState::default());
    let before = Timestamp::now();
    thread::sleep(Duration::from_millis(5));

    store.dispatch(Action::app_ready()).unwrap();
    thread::sleep(Duration::from_millis(5));
    let middle = Timestamp::now();
    thread::sleep(Duration::from_millis(5));
    store.dispatch(Action::language_change("it")).unwrap();
    thread::sleep(Duration::from_millis(50));
    let after = Timestamp::now();

    let first = store.get_state_at_time(before).unwrap();
    assert_eq!(first.action_id, None);

    let last = store.get_state_at_time(after).unwrap();
    assert_eq!(last.discriminator, Some(ActionType::LanguageChange));
    assert_eq!(last.state().current_target_language, "it");

    let near_middle = store.get_state_at_time(middle).unwrap();
    assert!(near_middle.action_id.is_some());
}

#[test]
fn test_clear_history_keeps_current_state() {
    let store = Store::new(AppState::default());
    store.dispatch(Action::app_ready()).unwrap();
    store.dispatch(Action::language_change("pt")).unwrap();

    store.clear_history();

    let history = store.get_history(10);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].to_state(), store.get_state());
    assert_eq!(history[0].action_id, None);
    assert_eq!(store.get_metrics().history_size, 1);
}

#[test]
fn test_snapshots_are_isolated_from_later_commits() {
    let store = Store::new(AppState::default());
    store.dispatch(Action::app_ready()).unwrap();
    let snapshot = store.get_history(1).remove(0);

    store.dispatch(Action::app_shutdown()).unwrap();

    assert_eq!(snapshot.state().status, AppStatus::Ready);
    assert_eq!(store.get_state().status, AppStatus::ShuttingDown);

    let mut copy = snapshot.to_state();
    copy.status = AppStatus::Error;
    assert_eq!(store.get_history(2)[0].state().status, AppStatus::Ready);
}

#[test]
fn test_snapshot_digest_matches_state() {
    let store = Store::new(AppState::default());
    store.dispatch(Action::app_ready()).unwrap();

    let snapshot = store.get_history(1).remove(0);
    let digest = snapshot.digest().unwrap();
    assert_eq!(
        digest,
        statestore::StateDigest::of(&store.get_state()).unwrap()
    );
    assert!(!snapshot.is_expired(Duration::from_secs(60)));
}

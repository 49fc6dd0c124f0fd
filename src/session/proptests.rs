//! Property-based tests for the session store

use super::*;
use crate::runtime::testing::{sample_config, StepClock};
use crate::state_machine::{CallEvent, CallStatus};
use proptest::prelude::*;
use std::sync::Arc;

fn arb_provider_word() -> impl Strategy<Value = &'static str> {
    proptest::sample::select(vec![
        "initiated",
        "queued",
        "ringing",
        "answered",
        "in-progress",
        "completed",
        "no-answer",
        "busy",
        "failed",
        "canceled",
    ])
}

fn store() -> SessionStore {
    SessionStore::new(Arc::new(StepClock::default()))
}

proptest! {
    #[test]
    fn prop_observed_status_is_monotonic(
        words in proptest::collection::vec(arb_provider_word(), 0..30)
    ) {
        let store = store();
        let id = store.create(sample_config()).session_id;
        let mut observed = vec![store.get(&id).unwrap().status];

        for raw in &words {
            store.apply_event(&id, &CallEvent::from_provider(raw)).unwrap();
            observed.push(store.get(&id).unwrap().status);
        }

        for pair in observed.windows(2) {
            prop_assert!(pair[1].rank() >= pair[0].rank());
            if pair[0].is_terminal() {
                prop_assert_eq!(pair[0], pair[1]);
            }
        }
    }

    #[test]
    fn prop_discard_counter_matches_rejections(
        words in proptest::collection::vec(arb_provider_word(), 0..30)
    ) {
        let store = store();
        let id = store.create(sample_config()).session_id;
        let mut discarded = 0u64;

        for raw in &words {
            let update = store.apply_event(&id, &CallEvent::from_provider(raw)).unwrap();
            if let StatusUpdate::Discarded { .. } = update {
                discarded += 1;
            }
        }
        prop_assert_eq!(store.discarded_transitions(), discarded);
    }

    #[test]
    fn prop_greeting_inserted_exactly_once(calls in 1usize..20) {
        let store = store();
        let id = store.create(sample_config()).session_id;

        for _ in 0..calls {
            store.ensure_greeting_captured(&id, "Hi, this is Aurora").unwrap();
        }

        let session = store.get(&id).unwrap();
        let system_turns = session.transcript.iter().filter(|t| t.role == Role::System).count();
        prop_assert_eq!(system_turns, 1);
    }

    #[test]
    fn prop_summary_never_overwritten(texts in proptest::collection::vec("[a-z ]{1,20}", 1..5)) {
        let store = store();
        let id = store.create(sample_config()).session_id;
        store.update_status(&id, CallStatus::Completed).unwrap();

        for text in &texts {
            store.set_summary(&id, text).unwrap();
        }
        prop_assert_eq!(store.get(&id).unwrap().summary, Some(texts[0].clone()));
    }
}

//! Property-based tests for the status state machine

use super::transition::TransitionError;
use super::*;
use proptest::prelude::*;

fn arb_status() -> impl Strategy<Value = CallStatus> {
    proptest::sample::select(CallStatus::ALL.to_vec())
}

fn arb_provider_word() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("initiated".to_string()),
        Just("queued".to_string()),
        Just("ringing".to_string()),
        Just("answered".to_string()),
        Just("in-progress".to_string()),
        Just("completed".to_string()),
        Just("no-answer".to_string()),
        Just("busy".to_string()),
        Just("canceled".to_string()),
        "[a-z-]{0,12}",
    ]
}

proptest! {
    #[test]
    fn prop_trajectory_never_regresses(
        words in proptest::collection::vec(arb_provider_word(), 0..40)
    ) {
        let mut status = CallStatus::Draft;
        let mut terminal_reached: Option<CallStatus> = None;

        for raw in &words {
            if let Ok(result) = transition(status, &CallEvent::from_provider(raw)) {
                prop_assert!(result.new_status.rank() >= status.rank());
                status = result.new_status;
            }
            if let Some(terminal) = terminal_reached {
                prop_assert_eq!(status, terminal);
            } else if status.is_terminal() {
                terminal_reached = Some(status);
            }
        }
    }

    #[test]
    fn prop_terminal_accepts_nothing(from in arb_status(), to in arb_status()) {
        prop_assume!(from.is_terminal());
        let result = transition(from, &CallEvent::status(to));
        let is_already_terminal = matches!(result, Err(TransitionError::AlreadyTerminal { .. }));
        prop_assert!(is_already_terminal);
    }

    #[test]
    fn prop_summary_only_on_entering_completed(from in arb_status(), to in arb_status()) {
        if let Ok(result) = transition(from, &CallEvent::status(to)) {
            let requests_summary = result.effects.contains(&Effect::RequestSummary);
            prop_assert_eq!(requests_summary, result.new_status == CallStatus::Completed);
            prop_assert_ne!(from, CallStatus::Completed);
        }
    }

    #[test]
    fn prop_mapper_is_total(raw in ".{0,24}") {
        // Every string lands on a reachable, non-draft status
        let status = CallStatus::from_provider(&raw);
        prop_assert_ne!(status, CallStatus::Draft);
    }
}

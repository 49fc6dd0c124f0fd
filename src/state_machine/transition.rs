//! Pure status transition function
//!
//! Forward-only lifecycle: `draft → queued → ringing → in-progress →
//! {completed | no-answer | failed}`. Repeated `in-progress` is accepted,
//! terminal states accept nothing, and anything pointing backwards is a
//! stale callback.

use super::{CallEvent, CallStatus, Effect};
use thiserror::Error;

/// Result of a status transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_status: CallStatus,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(status: CallStatus) -> Self {
        Self {
            new_status: status,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Transitions the state machine refuses
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("call already ended as {from}, ignoring {requested}")]
    AlreadyTerminal {
        from: CallStatus,
        requested: CallStatus,
    },
    #[error("stale status {requested} while call is {from}")]
    Stale {
        from: CallStatus,
        requested: CallStatus,
    },
}

/// Pure transition function: same inputs, same outputs, no I/O.
pub fn transition(
    current: CallStatus,
    event: &CallEvent,
) -> Result<TransitionResult, TransitionError> {
    let CallEvent::ProviderStatus { status, raw } = event;
    let requested = *status;

    match (current, requested) {
        (from, requested) if from.is_terminal() => {
            Err(TransitionError::AlreadyTerminal { from, requested })
        }

        // Live-call callbacks repeat while the call is up
        (CallStatus::InProgress, CallStatus::InProgress) => {
            Ok(TransitionResult::new(CallStatus::InProgress))
        }

        (_, CallStatus::Completed) => {
            Ok(TransitionResult::new(CallStatus::Completed).with_effect(Effect::RequestSummary))
        }

        (_, CallStatus::Failed) => {
            Ok(TransitionResult::new(CallStatus::Failed).with_effect(Effect::record_error(
                format!("call ended with provider status '{raw}'"),
            )))
        }

        (from, requested) if requested.rank() > from.rank() => {
            Ok(TransitionResult::new(requested))
        }

        (from, requested) => Err(TransitionError::Stale { from, requested }),
    }
}

//! Events that drive status transitions

use super::CallStatus;

/// Input to the status state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    /// A status reported by the telephony provider, already normalized.
    /// `raw` keeps the provider's own word for diagnostics.
    ProviderStatus { status: CallStatus, raw: String },
}

impl CallEvent {
    /// Build an event from the provider's raw status string
    pub fn from_provider(raw: &str) -> Self {
        CallEvent::ProviderStatus {
            status: CallStatus::from_provider(raw),
            raw: raw.trim().to_string(),
        }
    }

    /// Build an event for an internally decided status
    pub fn status(status: CallStatus) -> Self {
        CallEvent::ProviderStatus {
            status,
            raw: status.as_str().to_string(),
        }
    }

    pub fn target(&self) -> CallStatus {
        match self {
            CallEvent::ProviderStatus { status, .. } => *status,
        }
    }
}

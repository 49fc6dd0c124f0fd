//! Call lifecycle status and the provider vocabulary mapping

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle stage of an outbound call.
///
/// Ordering is forward-only: `Draft < Queued < Ringing < InProgress`, and the
/// three terminal states sit after `InProgress` with no way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallStatus {
    #[default]
    Draft,
    Queued,
    Ringing,
    InProgress,
    Completed,
    NoAnswer,
    Failed,
}

impl CallStatus {
    #[cfg(test)]
    pub const ALL: [CallStatus; 7] = [
        CallStatus::Draft,
        CallStatus::Queued,
        CallStatus::Ringing,
        CallStatus::InProgress,
        CallStatus::Completed,
        CallStatus::NoAnswer,
        CallStatus::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CallStatus::Draft => "draft",
            CallStatus::Queued => "queued",
            CallStatus::Ringing => "ringing",
            CallStatus::InProgress => "in-progress",
            CallStatus::Completed => "completed",
            CallStatus::NoAnswer => "no-answer",
            CallStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CallStatus::Completed | CallStatus::NoAnswer | CallStatus::Failed
        )
    }

    /// Position in the forward order. All terminal states share the last rank.
    pub fn rank(self) -> u8 {
        match self {
            CallStatus::Draft => 0,
            CallStatus::Queued => 1,
            CallStatus::Ringing => 2,
            CallStatus::InProgress => 3,
            CallStatus::Completed | CallStatus::NoAnswer | CallStatus::Failed => 4,
        }
    }

    /// Map the telephony provider's status vocabulary onto ours.
    ///
    /// Anything outside the known set (`busy`, `canceled`, typos, new
    /// provider values) maps to `Failed` so the terminal logic still runs.
    pub fn from_provider(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "initiated" | "queued" => CallStatus::Queued,
            "ringing" => CallStatus::Ringing,
            "answered" | "in-progress" => CallStatus::InProgress,
            "completed" => CallStatus::Completed,
            "no-answer" => CallStatus::NoAnswer,
            _ => CallStatus::Failed,
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_mapping() {
        assert_eq!(CallStatus::from_provider("initiated"), CallStatus::Queued);
        assert_eq!(CallStatus::from_provider("queued"), CallStatus::Queued);
        assert_eq!(CallStatus::from_provider("ringing"), CallStatus::Ringing);
        assert_eq!(CallStatus::from_provider("answered"), CallStatus::InProgress);
        assert_eq!(CallStatus::from_provider("in-progress"), CallStatus::InProgress);
        assert_eq!(CallStatus::from_provider("completed"), CallStatus::Completed);
        assert_eq!(CallStatus::from_provider("no-answer"), CallStatus::NoAnswer);
    }

    #[test]
    fn test_unmapped_provider_status_fails_safe() {
        for raw in ["busy", "failed", "canceled", "", "voicemail", "COMPLETED-ish"] {
            assert_eq!(CallStatus::from_provider(raw), CallStatus::Failed, "{raw}");
        }
    }

    #[test]
    fn test_serde_uses_provider_spelling() {
        let json = serde_json::to_string(&CallStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        let parsed: CallStatus = serde_json::from_str("\"no-answer\"").unwrap();
        assert_eq!(parsed, CallStatus::NoAnswer);
    }

    #[test]
    fn test_rank_orders_live_states() {
        let live = [
            CallStatus::Draft,
            CallStatus::Queued,
            CallStatus::Ringing,
            CallStatus::InProgress,
        ];
        assert!(live.windows(2).all(|w| w[0].rank() < w[1].rank()));
        assert!(CallStatus::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .all(|s| s.rank() > CallStatus::InProgress.rank()));
    }
}

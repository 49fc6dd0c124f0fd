//! Effects produced by status transitions

/// Work to perform after a transition has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Record an operational failure on the session
    RecordError { message: String },

    /// Ask the model for a condensed summary of the transcript
    RequestSummary,
}

impl Effect {
    pub fn record_error(message: impl Into<String>) -> Self {
        Effect::RecordError {
            message: message.into(),
        }
    }
}

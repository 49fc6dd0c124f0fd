//! API request and response types

use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Response with a single session
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session: Session,
}

/// Dashboard listing, newest session first
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    pub sessions: Vec<Session>,
    /// Status callbacks dropped as stale or post-terminal since startup
    pub discarded_transitions: u64,
}

/// `session_id` query parameter carried by every webhook URL
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// Speech gather callback body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GatherForm {
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

/// Call status callback body
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusForm {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "CallStatus")]
    pub call_status: String,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            session_id: None,
        }
    }
}

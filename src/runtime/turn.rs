//! Turn engine
//!
//! One speech-in, reply-out exchange per call: record what the caller said,
//! ask the model with the full transcript, record and return the reply.
//! A failed or empty completion degrades to a fixed fallback line.

use crate::llm::{LlmMessage, LlmRequest, LlmService, MessageRole};
use crate::session::{Role, Session, SessionStore, StoreError};
use crate::system_prompt::build_system_prompt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

/// Spoken when recognition produced nothing, followed by the opening question
pub const REPROMPT_LINE: &str = "Sorry, I didn't catch that.";

/// Spoken when the model fails or returns nothing usable
pub const FALLBACK_LINE: &str =
    "Sorry, I'm having a little trouble on my end. Could you say that one more time?";

const REPLY_MAX_TOKENS: u32 = 200;

/// Reply deadline, kept under the provider's 15 s webhook timeout
const REPLY_TIMEOUT: Duration = Duration::from_secs(10);

/// How the reply text was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing heard; no turn recorded
    Reprompt,
    /// Model reply recorded
    Model,
    /// Fallback line recorded in place of a model reply
    Fallback,
}

/// Text to speak plus whether to listen again afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnReply {
    pub reply_text: String,
    pub reopen_prompt: bool,
    pub outcome: TurnOutcome,
}

/// Failures that stop a speech exchange from producing a reply
#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Exchange for session {session_id} did not finish: {reason}")]
    Interrupted { session_id: String, reason: String },
}

pub struct TurnEngine {
    store: Arc<SessionStore>,
    llm: Arc<dyn LlmService>,
}

impl TurnEngine {
    pub fn new(store: Arc<SessionStore>, llm: Arc<dyn LlmService>) -> Self {
        Self { store, llm }
    }

    /// Handle one recognized utterance for a session.
    ///
    /// Exchanges on the same session run one at a time, so every user turn
    /// is followed by its own assistant turn. The exchange runs as its own
    /// task: dropping this future (client disconnect, webhook timeout) does
    /// not stop the reply from being recorded. The model call holds only
    /// that session's turn gate, never the store's data locks.
    pub async fn handle(&self, session_id: &str, recognized: &str) -> Result<TurnReply, TurnError> {
        let speech = recognized.trim();

        if speech.is_empty() {
            let session = self
                .store
                .get(session_id)
                .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))?;
            tracing::debug!(session_id = %session_id, "No speech recognized, re-prompting");
            return Ok(TurnReply {
                reply_text: format!("{REPROMPT_LINE} {}", session.config.opening_question),
                reopen_prompt: true,
                outcome: TurnOutcome::Reprompt,
            });
        }

        let gate = self.store.turn_gate(session_id)?;
        let exchange = tokio::spawn(run_exchange(
            self.store.clone(),
            self.llm.clone(),
            gate,
            session_id.to_string(),
            speech.to_string(),
        ));

        match exchange.await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(session_id = %session_id, error = %e, "Exchange task failed");
                Err(TurnError::Interrupted {
                    session_id: session_id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

/// User append, model call, assistant append, under the session's gate
async fn run_exchange(
    store: Arc<SessionStore>,
    llm: Arc<dyn LlmService>,
    gate: Arc<tokio::sync::Mutex<()>>,
    session_id: String,
    speech: String,
) -> Result<TurnReply, TurnError> {
    let _exchange = gate.lock_owned().await;

    let snapshot = store.append_and_snapshot(&session_id, Role::User, &speech)?;
    let request = build_request(&snapshot);

    let (reply_text, outcome) = match timeout(REPLY_TIMEOUT, llm.complete(&request)).await {
        Ok(Ok(response)) => {
            let text = response.text.trim();
            if text.is_empty() {
                tracing::warn!(
                    session_id = %session_id,
                    "Model returned an empty reply, using fallback line"
                );
                (FALLBACK_LINE.to_string(), TurnOutcome::Fallback)
            } else {
                (text.to_string(), TurnOutcome::Model)
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                "Completion failed, using fallback line"
            );
            (FALLBACK_LINE.to_string(), TurnOutcome::Fallback)
        }
        Err(_) => {
            tracing::warn!(
                session_id = %session_id,
                timeout_ms = REPLY_TIMEOUT.as_millis(),
                "Completion timed out, using fallback line"
            );
            (FALLBACK_LINE.to_string(), TurnOutcome::Fallback)
        }
    };

    store.append_turn(&session_id, Role::Assistant, &reply_text)?;

    Ok(TurnReply {
        reply_text,
        reopen_prompt: true,
        outcome,
    })
}

/// Full transcript in order, behind the persona prompt
pub(crate) fn build_request(session: &Session) -> LlmRequest {
    let messages = session
        .transcript
        .iter()
        .map(|turn| {
            let role = match turn.role {
                Role::System => MessageRole::System,
                Role::User => MessageRole::User,
                Role::Assistant => MessageRole::Assistant,
            };
            LlmMessage::new(role, turn.content.clone())
        })
        .collect();

    LlmRequest::new(messages)
        .with_system(build_system_prompt(&session.config))
        .with_temperature(session.config.temperature)
        .with_max_tokens(REPLY_MAX_TOKENS)
}

//! Call runtime
//!
//! Owns the session store and the external collaborators, and exposes the
//! four operations the HTTP layer drives: create a session, apply a provider
//! status callback, handle a speech turn, and list sessions.

mod summary;
mod turn;

#[cfg(test)]
mod proptests;
#[cfg(test)]
pub mod testing;

pub use turn::{TurnEngine, TurnError, TurnOutcome, TurnReply};

use crate::llm::LlmService;
use crate::session::{
    Session, SessionConfig, SessionDraft, SessionStore, StatusUpdate, StoreError, ValidationError,
};
use crate::state_machine::{CallEvent, CallStatus};
use crate::telephony::{CallPlacer, PlaceCallRequest, TelephonyError, WebhookUrls};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error("Could not place call for session {session_id}: {source}")]
    Placement {
        session_id: String,
        #[source]
        source: TelephonyError,
    },
    #[error("No session matches call {0}")]
    UnknownCall(String),
}

/// Result of applying one provider status callback
#[derive(Debug)]
pub struct StatusOutcome {
    pub session_id: String,
    pub update: StatusUpdate,
    /// Set when the callback completed the call and a summary was started
    pub summary_task: Option<JoinHandle<()>>,
}

pub struct CallRuntime {
    store: Arc<SessionStore>,
    engine: TurnEngine,
    llm: Arc<dyn LlmService>,
    placer: Arc<dyn CallPlacer>,
    webhooks: WebhookUrls,
}

impl CallRuntime {
    pub fn new(
        store: Arc<SessionStore>,
        llm: Arc<dyn LlmService>,
        placer: Arc<dyn CallPlacer>,
        webhooks: WebhookUrls,
    ) -> Self {
        let engine = TurnEngine::new(store.clone(), llm.clone());
        Self {
            store,
            engine,
            llm,
            placer,
            webhooks,
        }
    }

    /// Validate the draft, create the session and dial.
    ///
    /// A placement failure keeps the session, in `draft` with `last_error`
    /// set, and is returned as [`RuntimeError::Placement`].
    pub async fn create_session(&self, draft: SessionDraft) -> Result<Session, RuntimeError> {
        let config = SessionConfig::try_from(draft)?;
        let session = self.store.create(config);
        let session_id = session.session_id.clone();

        let request = PlaceCallRequest {
            session_id: session_id.clone(),
            to: session.config.to.clone(),
            voice_url: self.webhooks.voice(&session_id),
            status_callback_url: self.webhooks.status(&session_id),
        };

        match self.placer.place_call(&request).await {
            Ok(call_id) => {
                self.store.set_call_id(&session_id, &call_id)?;
                self.store.update_status(&session_id, CallStatus::Queued)?;
                tracing::info!(session_id = %session_id, call_id = %call_id, "Call placed");
                self.require(&session_id)
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Call placement failed");
                self.store.set_error(&session_id, &e.to_string())?;
                Err(RuntimeError::Placement {
                    session_id,
                    source: e,
                })
            }
        }
    }

    /// Apply a provider status callback.
    ///
    /// The session is found by provider call id first, then by the session
    /// id carried in the callback URL. A late call id is recorded on the
    /// session found that way.
    pub fn on_call_status(
        &self,
        call_id: Option<&str>,
        session_id: Option<&str>,
        provider_status: &str,
    ) -> Result<StatusOutcome, RuntimeError> {
        let session_id = self.resolve_call(call_id, session_id)?;
        let event = CallEvent::from_provider(provider_status);
        let update = self.store.apply_event(&session_id, &event)?;

        match &update {
            StatusUpdate::Applied { from, to, .. } => {
                tracing::info!(
                    session_id = %session_id,
                    %from,
                    %to,
                    raw = %provider_status,
                    "Call status changed"
                );
            }
            StatusUpdate::Discarded { current, requested } => {
                tracing::debug!(
                    session_id = %session_id,
                    %current,
                    %requested,
                    "Status callback discarded"
                );
            }
        }

        let summary_task = if update.requests_summary() {
            self.spawn_summary(&session_id)
        } else {
            None
        };

        Ok(StatusOutcome {
            session_id,
            update,
            summary_task,
        })
    }

    /// Handle recognized speech for a session
    pub async fn on_speech_turn(
        &self,
        session_id: &str,
        speech: &str,
    ) -> Result<TurnReply, RuntimeError> {
        Ok(self.engine.handle(session_id, speech).await?)
    }

    /// Record the greeting as the opening `system` turn, once, and return
    /// the session for rendering the voice script.
    pub fn capture_greeting(&self, session_id: &str) -> Result<Session, RuntimeError> {
        let session = self.require(session_id)?;
        if self
            .store
            .ensure_greeting_captured(session_id, &session.config.greeting)?
        {
            tracing::debug!(session_id = %session_id, "Greeting captured");
        }
        self.require(session_id)
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.store.get(session_id)
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        self.store.list_all()
    }

    pub fn discarded_transitions(&self) -> u64 {
        self.store.discarded_transitions()
    }

    fn require(&self, session_id: &str) -> Result<Session, RuntimeError> {
        self.store
            .get(session_id)
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()).into())
    }

    fn resolve_call(
        &self,
        call_id: Option<&str>,
        session_id: Option<&str>,
    ) -> Result<String, RuntimeError> {
        let call_id = call_id.map(str::trim).filter(|c| !c.is_empty());
        let session_id = session_id.map(str::trim).filter(|s| !s.is_empty());

        if let Some(session) = call_id.and_then(|c| self.store.find_by_call_id(c)) {
            return Ok(session.session_id);
        }

        let unknown = || {
            let named = call_id.or(session_id).unwrap_or("<none>");
            RuntimeError::UnknownCall(named.to_string())
        };
        let session = session_id
            .and_then(|s| self.store.get(s))
            .ok_or_else(unknown)?;

        if let Some(call_id) = call_id {
            match self.store.set_call_id(&session.session_id, call_id) {
                Ok(()) => {}
                Err(StoreError::CallIdConflict { existing, .. }) => {
                    tracing::warn!(
                        session_id = %session.session_id,
                        existing = %existing,
                        call_id = %call_id,
                        "Status callback names a different call"
                    );
                    return Err(unknown());
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(session.session_id)
    }

    /// Summarize the completed call in the background. Nothing is started
    /// when the caller and agent never spoke.
    fn spawn_summary(&self, session_id: &str) -> Option<JoinHandle<()>> {
        let session = self.store.get(session_id)?;
        if session.conversation_turns().next().is_none() {
            tracing::debug!(session_id = %session_id, "No conversation to summarize");
            return None;
        }

        let store = self.store.clone();
        let llm = self.llm.clone();
        Some(tokio::spawn(async move {
            let Some(text) = summary::summarize(&session.transcript, llm.as_ref()).await else {
                return;
            };
            match store.set_summary(&session.session_id, &text) {
                Ok(true) => tracing::info!(session_id = %session.session_id, "Call summary stored"),
                Ok(false) => {
                    tracing::debug!(
                        session_id = %session.session_id,
                        "Summary already present, dropped"
                    );
                }
                Err(e) => tracing::warn!(
                    session_id = %session.session_id,
                    error = %e,
                    "Could not store summary"
                ),
            }
        }))
    }
}

//! In-memory session table
//!
//! Each session lives in its own slot behind a short synchronous mutex, so a
//! mutation on one session is atomic with respect to every other mutation on
//! that session and never blocks other sessions. Slots also carry an async
//! turn gate the turn engine holds across a full speech exchange.

use super::clock::{new_id, Clock, SystemClock};
use super::types::{Role, Session, SessionConfig, Turn};
use crate::state_machine::{transition, CallEvent, CallStatus, Effect};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),
    #[error("Turn content must not be empty")]
    EmptyTurn,
    #[error("Session {session_id} already has call id {existing}, refusing {attempted}")]
    CallIdConflict {
        session_id: String,
        existing: String,
        attempted: String,
    },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of feeding a status event to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// Transition applied. `effects` holds what the caller still has to run.
    Applied {
        from: CallStatus,
        to: CallStatus,
        effects: Vec<Effect>,
    },
    /// Stale or post-terminal event, dropped without touching the session
    Discarded {
        current: CallStatus,
        requested: CallStatus,
    },
}

impl StatusUpdate {
    pub fn requests_summary(&self) -> bool {
        matches!(
            self,
            StatusUpdate::Applied { effects, .. } if effects.contains(&Effect::RequestSummary)
        )
    }
}

struct SessionSlot {
    data: Mutex<Session>,
    turn_gate: Arc<tokio::sync::Mutex<()>>,
}

impl SessionSlot {
    fn lock(&self) -> MutexGuard<'_, Session> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Authoritative table of call sessions
pub struct SessionStore {
    clock: Arc<dyn Clock>,
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    call_index: RwLock<HashMap<String, String>>,
    discarded_transitions: AtomicU64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::default()))
    }
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            sessions: RwLock::new(HashMap::new()),
            call_index: RwLock::new(HashMap::new()),
            discarded_transitions: AtomicU64::new(0),
        }
    }

    // ==================== Lookup ====================

    fn slot(&self, session_id: &str) -> StoreResult<Arc<SessionSlot>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_string()))
    }

    /// Run `f` against the session under its lock
    fn with_session<R>(
        &self,
        session_id: &str,
        f: impl FnOnce(&mut Session, DateTime<Utc>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let slot = self.slot(session_id)?;
        let mut session = slot.lock();
        f(&mut session, self.clock.now())
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.slot(session_id).ok().map(|slot| slot.lock().clone())
    }

    pub fn find_by_call_id(&self, call_id: &str) -> Option<Session> {
        let session_id = self
            .call_index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(call_id)
            .cloned()?;
        self.get(&session_id)
    }

    /// Snapshot of every session, newest first. Each snapshot is taken under
    /// that session's lock, so no half-applied mutation is visible.
    pub fn list_all(&self) -> Vec<Session> {
        let slots: Vec<Arc<SessionSlot>> = self
            .sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut sessions: Vec<Session> = slots.iter().map(|slot| slot.lock().clone()).collect();
        sessions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    /// Number of status events dropped as stale or post-terminal
    pub fn discarded_transitions(&self) -> u64 {
        self.discarded_transitions.load(Ordering::Relaxed)
    }

    /// Per-session gate serializing speech exchanges
    pub(crate) fn turn_gate(&self, session_id: &str) -> StoreResult<Arc<tokio::sync::Mutex<()>>> {
        Ok(self.slot(session_id)?.turn_gate.clone())
    }

    // ==================== Mutation ====================

    pub fn create(&self, config: SessionConfig) -> Session {
        let now = self.clock.now();
        let session = Session {
            session_id: new_id(),
            call_id: None,
            config,
            status: CallStatus::Draft,
            transcript: Vec::new(),
            summary: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        };

        let slot = Arc::new(SessionSlot {
            data: Mutex::new(session.clone()),
            turn_gate: Arc::new(tokio::sync::Mutex::new(())),
        });
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(session.session_id.clone(), slot);

        tracing::debug!(session_id = %session.session_id, "Session created");
        session
    }

    /// Record the provider call id. Setting the same id again is a no-op;
    /// a different id is refused and the original kept.
    pub fn set_call_id(&self, session_id: &str, call_id: &str) -> StoreResult<()> {
        let newly_set = self.with_session(session_id, |session, now| match &session.call_id {
            Some(existing) if existing == call_id => Ok(false),
            Some(existing) => Err(StoreError::CallIdConflict {
                session_id: session_id.to_string(),
                existing: existing.clone(),
                attempted: call_id.to_string(),
            }),
            None => {
                session.call_id = Some(call_id.to_string());
                session.updated_at = now;
                Ok(true)
            }
        })?;

        if newly_set {
            self.call_index
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(call_id.to_string(), session_id.to_string());
        }
        Ok(())
    }

    pub fn append_turn(&self, session_id: &str, role: Role, content: &str) -> StoreResult<Turn> {
        self.with_session(session_id, |session, now| push_turn(session, role, content, now))
    }

    /// Append a turn and return the session as it stands right after,
    /// in one critical section.
    pub fn append_and_snapshot(
        &self,
        session_id: &str,
        role: Role,
        content: &str,
    ) -> StoreResult<Session> {
        self.with_session(session_id, |session, now| {
            push_turn(session, role, content, now)?;
            Ok(session.clone())
        })
    }

    /// Insert the greeting as the single `system` turn, once. Returns whether
    /// a turn was inserted. Safe to call on every webhook for the session.
    pub fn ensure_greeting_captured(&self, session_id: &str, greeting: &str) -> StoreResult<bool> {
        self.with_session(session_id, |session, now| {
            if session.has_greeting() || greeting.trim().is_empty() {
                return Ok(false);
            }
            if !session.transcript.is_empty() {
                // The greeting must precede every other turn; too late now
                tracing::warn!(
                    session_id = %session_id,
                    turns = session.transcript.len(),
                    "Conversation already started, greeting not captured"
                );
                return Ok(false);
            }
            push_turn(session, Role::System, greeting, now)?;
            Ok(true)
        })
    }

    pub fn update_status(&self, session_id: &str, status: CallStatus) -> StoreResult<StatusUpdate> {
        self.apply_event(session_id, &CallEvent::status(status))
    }

    /// Feed a status event through the state machine. Illegal transitions
    /// are counted and dropped, never raised.
    pub fn apply_event(&self, session_id: &str, event: &CallEvent) -> StoreResult<StatusUpdate> {
        let update = self.with_session(session_id, |session, now| {
            let from = session.status;
            match transition(from, event) {
                Ok(result) => {
                    session.status = result.new_status;
                    session.updated_at = now;

                    let mut deferred = Vec::new();
                    for effect in result.effects {
                        match effect {
                            Effect::RecordError { message } => session.last_error = Some(message),
                            other => deferred.push(other),
                        }
                    }

                    Ok(StatusUpdate::Applied {
                        from,
                        to: result.new_status,
                        effects: deferred,
                    })
                }
                Err(e) => {
                    tracing::debug!(
                        session_id = %session_id,
                        reason = %e,
                        "Discarding status transition"
                    );
                    Ok(StatusUpdate::Discarded {
                        current: from,
                        requested: event.target(),
                    })
                }
            }
        })?;

        if matches!(update, StatusUpdate::Discarded { .. }) {
            self.discarded_transitions.fetch_add(1, Ordering::Relaxed);
        }
        Ok(update)
    }

    /// Store the call summary. Only accepted once, and only after the call
    /// completed; returns whether it was stored.
    pub fn set_summary(&self, session_id: &str, text: &str) -> StoreResult<bool> {
        self.with_session(session_id, |session, now| {
            if session.status != CallStatus::Completed || session.summary.is_some() {
                return Ok(false);
            }
            session.summary = Some(text.to_string());
            session.updated_at = now;
            Ok(true)
        })
    }

    pub fn set_error(&self, session_id: &str, text: &str) -> StoreResult<()> {
        self.with_session(session_id, |session, now| {
            session.last_error = Some(text.to_string());
            session.updated_at = now;
            Ok(())
        })
    }
}

fn push_turn(
    session: &mut Session,
    role: Role,
    content: &str,
    now: DateTime<Utc>,
) -> StoreResult<Turn> {
    if content.trim().is_empty() {
        return Err(StoreError::EmptyTurn);
    }
    let turn = Turn {
        id: new_id(),
        role,
        content: content.to_string(),
        timestamp: now,
    };
    session.transcript.push(turn.clone());
    session.updated_at = now;
    Ok(turn)
}

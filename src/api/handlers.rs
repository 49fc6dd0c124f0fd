//! HTTP request handlers

use super::types::{
    ErrorResponse, GatherForm, SessionListResponse, SessionQuery, SessionResponse, StatusForm,
};
use super::AppState;
use crate::runtime::{RuntimeError, TurnError};
use crate::session::{SessionDraft, StoreError};
use crate::telephony::twiml;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Dashboard
        .route("/api/calls", post(create_call))
        .route("/api/sessions", get(list_sessions))
        .route("/api/sessions/:id", get(get_session))
        // Telephony webhooks
        .route("/twilio/voice", post(twilio_voice))
        .route("/twilio/gather", post(twilio_gather))
        .route("/twilio/status", post(twilio_status))
        // Version
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Dashboard
// ============================================================

async fn create_call(
    State(state): State<AppState>,
    Json(draft): Json<SessionDraft>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.runtime.create_session(draft).await?;
    Ok((StatusCode::CREATED, Json(SessionResponse { session })))
}

async fn list_sessions(State(state): State<AppState>) -> Json<SessionListResponse> {
    Json(SessionListResponse {
        sessions: state.runtime.list_sessions(),
        discarded_transitions: state.runtime.discarded_transitions(),
    })
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .runtime
        .get_session(&id)
        .ok_or_else(|| AppError::NotFound(format!("Session not found: {id}")))?;
    Ok(Json(SessionResponse { session }))
}

// ============================================================
// Telephony webhooks
// ============================================================

/// Voice script markup
struct TwiML(String);

impl IntoResponse for TwiML {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, "text/xml")], self.0).into_response()
    }
}

async fn twilio_voice(State(state): State<AppState>, Query(query): Query<SessionQuery>) -> TwiML {
    let Some(session_id) = query.session_id else {
        tracing::warn!("Voice webhook without session_id");
        return TwiML(twiml::apology());
    };

    match state.runtime.capture_greeting(&session_id) {
        Ok(session) => TwiML(twiml::greeting(&session)),
        Err(e) => {
            tracing::warn!(
                session_id = %session_id,
                error = %e,
                "Voice webhook for unknown session"
            );
            TwiML(twiml::apology())
        }
    }
}

async fn twilio_gather(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Form(form): Form<GatherForm>,
) -> TwiML {
    let Some(session_id) = query.session_id else {
        tracing::warn!("Gather webhook without session_id");
        return TwiML(twiml::apology());
    };

    let speech = form.speech_result.unwrap_or_default();
    let reply = match state.runtime.on_speech_turn(&session_id, &speech).await {
        Ok(reply) => reply,
        Err(e) => {
            tracing::warn!(session_id = %session_id, error = %e, "Gather webhook failed");
            return TwiML(twiml::apology());
        }
    };

    match state.runtime.get_session(&session_id) {
        Some(session) => TwiML(twiml::reply(&session, &reply)),
        None => TwiML(twiml::apology()),
    }
}

async fn twilio_status(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Form(form): Form<StatusForm>,
) -> Result<StatusCode, AppError> {
    let outcome = state.runtime.on_call_status(
        form.call_sid.as_deref(),
        query.session_id.as_deref(),
        &form.call_status,
    )?;
    // A started summary keeps running after its handle is dropped
    tracing::debug!(
        session_id = %outcome.session_id,
        summarizing = outcome.summary_task.is_some(),
        "Status callback handled"
    );
    Ok(StatusCode::NO_CONTENT)
}

async fn get_version() -> &'static str {
    concat!("outbound-caller ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

enum AppError {
    BadRequest(String),
    NotFound(String),
    BadGateway { message: String, session_id: String },
    Internal(String),
}

impl From<RuntimeError> for AppError {
    fn from(e: RuntimeError) -> Self {
        match e {
            RuntimeError::Validation(e) => AppError::BadRequest(e.to_string()),
            RuntimeError::Placement { session_id, source } => AppError::BadGateway {
                message: format!("Could not place call: {source}"),
                session_id,
            },
            e @ (RuntimeError::UnknownCall(_)
            | RuntimeError::Store(StoreError::SessionNotFound(_))
            | RuntimeError::Turn(TurnError::Store(StoreError::SessionNotFound(_)))) => {
                AppError::NotFound(e.to_string())
            }
            e @ (RuntimeError::Store(_) | RuntimeError::Turn(_)) => {
                AppError::Internal(e.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::BadGateway {
                message,
                session_id,
            } => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse {
                    error: message,
                    session_id: Some(session_id),
                },
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg))
            }
        };

        (status, Json(body)).into_response()
    }
}

//! Telephony provider integration
//!
//! Outbound call placement plus the webhook URLs and voice script markup
//! the provider consumes.

mod twilio;
pub mod twiml;

pub use twilio::{TwilioClient, TwilioConfig};

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Call placement failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelephonyError {
    #[error("telephony provider is not configured")]
    NotConfigured,
    #[error("telephony transport error: {0}")]
    Transport(String),
    #[error("telephony provider rejected the call ({status}): {message}")]
    Provider { status: u16, message: String },
    #[error("unexpected telephony provider response: {0}")]
    InvalidResponse(String),
}

/// Everything the provider needs to dial and call us back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceCallRequest {
    pub session_id: String,
    pub to: String,
    pub voice_url: String,
    pub status_callback_url: String,
}

/// Capability to place an outbound call; returns the provider's call id
#[async_trait]
pub trait CallPlacer: Send + Sync {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TelephonyError>;
}

/// Build the configured placer. Without credentials every placement fails.
pub fn build_placer(config: Option<&TwilioConfig>) -> Result<Arc<dyn CallPlacer>, TelephonyError> {
    match config {
        Some(config) => Ok(Arc::new(TwilioClient::new(config.clone())?)),
        None => {
            tracing::warn!("Twilio credentials missing; outbound calls are disabled");
            Ok(Arc::new(DisabledPlacer))
        }
    }
}

struct DisabledPlacer;

#[async_trait]
impl CallPlacer for DisabledPlacer {
    async fn place_call(&self, _request: &PlaceCallRequest) -> Result<String, TelephonyError> {
        Err(TelephonyError::NotConfigured)
    }
}

/// Webhook locations handed to the provider
#[derive(Debug, Clone)]
pub struct WebhookUrls {
    base: String,
}

impl WebhookUrls {
    pub fn new(public_base: &str) -> Self {
        Self {
            base: public_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn voice(&self, session_id: &str) -> String {
        format!("{}{}", self.base, voice_path(session_id))
    }

    pub fn status(&self, session_id: &str) -> String {
        format!("{}/twilio/status?session_id={session_id}", self.base)
    }
}

pub fn voice_path(session_id: &str) -> String {
    format!("/twilio/voice?session_id={session_id}")
}

/// Path the voice script posts gathered speech to
pub fn gather_path(session_id: &str) -> String {
    format!("/twilio/gather?session_id={session_id}")
}

//! HTTP API for the outbound caller
//!
//! JSON endpoints for the dashboard plus the form-encoded webhooks the
//! telephony provider calls during a call.

mod handlers;
mod types;

pub use handlers::create_router;

use crate::runtime::CallRuntime;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub runtime: Arc<CallRuntime>,
}

impl AppState {
    pub fn new(runtime: CallRuntime) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }
}

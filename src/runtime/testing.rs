//! Mock implementations for testing
//!
//! These mocks stand in for the completion provider, the telephony provider
//! and the wall clock, so runtime and handler tests never do real I/O.

use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::session::{Clock, SessionConfig, SessionDraft};
use crate::telephony::{CallPlacer, PlaceCallRequest, TelephonyError};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

// ============================================================================
// Fixtures
// ============================================================================

pub fn sample_draft() -> SessionDraft {
    SessionDraft {
        persona: "Aurora, a scheduling assistant".to_string(),
        greeting: "Hi, this is Aurora".to_string(),
        opening_question: "Do you have a minute to talk about your renewal?".to_string(),
        to: "+14155550100".to_string(),
        ..SessionDraft::default()
    }
}

pub fn sample_config() -> SessionConfig {
    SessionConfig::try_from(sample_draft()).unwrap()
}

/// Clock that advances one second on every reading
pub struct StepClock {
    base: DateTime<Utc>,
    ticks: AtomicI64,
}

impl Default for StepClock {
    fn default() -> Self {
        Self {
            base: Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap(),
            ticks: AtomicI64::new(0),
        }
    }
}

impl Clock for StepClock {
    fn now(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        self.base + chrono::Duration::seconds(tick)
    }
}

// ============================================================================
// Mock LLM
// ============================================================================

/// Mock completion service that returns queued responses
pub struct MockLlm {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    /// Record of all requests made
    pub requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful text reply
    pub fn queue_text(&self, text: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(LlmResponse::text(text)));
    }

    /// Queue an error response
    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmService for MockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

/// Mock completion service that waits before answering.
///
/// `request_started` is notified as soon as a request arrives, so a test can
/// act while the completion is still in flight.
pub struct DelayedMockLlm {
    pub inner: MockLlm,
    delay: Duration,
    pub request_started: Arc<Notify>,
}

impl DelayedMockLlm {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockLlm::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl LlmService for DelayedMockLlm {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.complete(request).await
    }

    fn model_id(&self) -> &str {
        "mock-delayed"
    }
}

// ============================================================================
// Mock call placer
// ============================================================================

/// Mock placer. Queued results are returned first; afterwards every call
/// succeeds with a generated call id.
pub struct MockCallPlacer {
    results: Mutex<VecDeque<Result<String, TelephonyError>>>,
    counter: AtomicUsize,
    /// Record of all placement requests
    pub requests: Mutex<Vec<PlaceCallRequest>>,
}

impl MockCallPlacer {
    pub fn new() -> Self {
        Self {
            results: Mutex::new(VecDeque::new()),
            counter: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_error(&self, error: TelephonyError) {
        self.results.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<PlaceCallRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockCallPlacer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CallPlacer for MockCallPlacer {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TelephonyError> {
        self.requests.lock().unwrap().push(request.clone());
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("CA{n:032}")))
    }
}

// ============================================================================
// Runtime harness
// ============================================================================

/// Runtime over a fresh step-clocked store, with webhooks on a fixed host
pub fn test_runtime(llm: Arc<dyn LlmService>, placer: Arc<dyn CallPlacer>) -> super::CallRuntime {
    let store = Arc::new(crate::session::SessionStore::new(Arc::new(StepClock::default())));
    super::CallRuntime::new(
        store,
        llm,
        placer,
        crate::telephony::WebhookUrls::new("https://calls.example.test"),
    )
}

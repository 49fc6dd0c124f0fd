//! LLM provider abstraction
//!
//! Provides a common interface for chat completions.

mod error;
mod openai;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use openai::{LlmConfig, OpenAiService};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for LLM providers
#[async_trait]
pub trait LlmService: Send + Sync {
    /// Make a completion request
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Build the configured completion service, wrapped with logging.
///
/// Without an API key every completion fails with an auth error, which
/// callers already treat as "no usable output".
pub fn build_service(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    let inner: Arc<dyn LlmService> = match config.api_key.as_deref() {
        Some(key) if !key.is_empty() => Arc::new(OpenAiService::new(config)?),
        _ => {
            tracing::warn!("No OPENAI_API_KEY configured; replies will use the fallback line");
            Arc::new(DisabledService {
                model_id: config.model.clone(),
            })
        }
    };
    Ok(Arc::new(LoggingService::new(inner)))
}

/// Stand-in used when no provider is configured
struct DisabledService {
    model_id: String,
}

#[async_trait]
impl LlmService for DisabledService {
    async fn complete(&self, _request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        Err(LlmError::auth("no LLM API key configured"))
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

/// Logging wrapper for LLM services
pub struct LoggingService {
    inner: Arc<dyn LlmService>,
    model_id: String,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn LlmService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl LlmService for LoggingService {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    messages = request.messages.len(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    "LLM request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    error = %e.message,
                    kind = ?e.kind,
                    retryable = e.kind.is_retryable(),
                    "LLM request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

//! Post-call summaries
//!
//! Best effort: a failed or empty completion leaves the session without a
//! summary and is only logged.

use crate::llm::{LlmMessage, LlmRequest, LlmService};
use crate::session::{Role, Turn};
use std::time::Duration;
use tokio::time::timeout;

const SUMMARY_PROMPT: &str = "You review transcripts of outbound phone calls. Summarize the call below for the team that placed it. Respond in exactly this format:
Summary:
- <key point>
Next steps:
- <follow-up action, or \"none\">

Transcript:";

const SUMMARY_TIMEOUT: Duration = Duration::from_secs(30);
const SUMMARY_MAX_TOKENS: u32 = 300;
const SUMMARY_TEMPERATURE: f32 = 0.2;

/// Role-labelled transcript lines, greeting excluded.
/// None when nobody said anything.
pub fn transcript_lines(turns: &[Turn]) -> Option<String> {
    let lines: Vec<String> = turns
        .iter()
        .filter(|t| t.role != Role::System)
        .map(|t| format!("{}: {}", t.role.as_str(), t.content))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Summarize a finished call.
///
/// Returns None if there is nothing to summarize or the completion fails.
pub async fn summarize(turns: &[Turn], llm: &dyn LlmService) -> Option<String> {
    let lines = transcript_lines(turns)?;

    let request = LlmRequest::new(vec![LlmMessage::user(format!("{SUMMARY_PROMPT}\n{lines}"))])
        .with_temperature(SUMMARY_TEMPERATURE)
        .with_max_tokens(SUMMARY_MAX_TOKENS);

    match timeout(SUMMARY_TIMEOUT, llm.complete(&request)).await {
        Ok(Ok(response)) => {
            let text = response.text.trim();
            if text.is_empty() {
                tracing::warn!("Summary completion returned no text");
                None
            } else {
                Some(text.to_string())
            }
        }
        Ok(Err(e)) => {
            tracing::warn!(kind = ?e.kind, "Summary LLM error: {}", e.message);
            None
        }
        Err(_) => {
            tracing::warn!("Summary generation timed out");
            None
        }
    }
}

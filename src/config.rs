//! Process configuration, read once from the environment at startup

use crate::llm::LlmConfig;
use crate::telephony::TwilioConfig;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Externally reachable base URL the provider uses for webhooks
    pub public_url: String,
    pub twilio: Option<TwilioConfig>,
    pub llm: LlmConfig,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let port = parse_port(std::env::var("OUTBOUND_PORT").ok().as_deref());
        let public_url = std::env::var("OUTBOUND_PUBLIC_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Self {
            port,
            public_url,
            twilio: TwilioConfig::from_env(),
            llm: LlmConfig::from_env(),
        }
    }
}

fn parse_port(raw: Option<&str>) -> u16 {
    raw.and_then(|p| p.trim().parse().ok()).unwrap_or(DEFAULT_PORT)
}

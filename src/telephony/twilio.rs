//! Twilio REST call placement

use super::{CallPlacer, PlaceCallRequest, TelephonyError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_API_BASE: &str = "https://api.twilio.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Twilio account credentials
#[derive(Debug, Clone)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

impl TwilioConfig {
    /// Read credentials from the environment; `None` if any is missing
    pub fn from_env() -> Option<Self> {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        Some(Self {
            account_sid: non_empty("TWILIO_ACCOUNT_SID")?,
            auth_token: non_empty("TWILIO_AUTH_TOKEN")?,
            from_number: non_empty("TWILIO_FROM_NUMBER")?,
            api_base: non_empty("TWILIO_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
        })
    }
}

pub struct TwilioClient {
    client: Client,
    config: TwilioConfig,
}

impl TwilioClient {
    pub fn new(config: TwilioConfig) -> Result<Self, TelephonyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TelephonyError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn calls_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.config.api_base.trim_end_matches('/'),
            self.config.account_sid
        )
    }

    fn form<'a>(&'a self, request: &'a PlaceCallRequest) -> Vec<(&'static str, &'a str)> {
        let mut form = vec![
            ("To", request.to.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Url", request.voice_url.as_str()),
            ("Method", "POST"),
            ("StatusCallback", request.status_callback_url.as_str()),
            ("StatusCallbackMethod", "POST"),
        ];
        for event in ["initiated", "ringing", "answered", "completed"] {
            form.push(("StatusCallbackEvent", event));
        }
        form
    }
}

#[async_trait]
impl CallPlacer for TwilioClient {
    async fn place_call(&self, request: &PlaceCallRequest) -> Result<String, TelephonyError> {
        let response = self
            .client
            .post(self.calls_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&self.form(request))
            .send()
            .await
            .map_err(|e| TelephonyError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TelephonyError::Provider {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let call: CallResource = response
            .json()
            .await
            .map_err(|e| TelephonyError::InvalidResponse(e.to_string()))?;

        tracing::debug!(
            session_id = %request.session_id,
            call_id = %call.sid,
            "Twilio accepted call"
        );
        Ok(call.sid)
    }
}

#[derive(Debug, Deserialize)]
struct CallResource {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    message: String,
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<TwilioErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> TwilioClient {
        TwilioClient::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "secret".to_string(),
            from_number: "+15005550006".to_string(),
            api_base: "https://api.twilio.test/".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_calls_url() {
        assert_eq!(
            client().calls_url(),
            "https://api.twilio.test/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[test]
    fn test_form_lists_every_status_event() {
        let client = client();
        let request = PlaceCallRequest {
            session_id: "s1".to_string(),
            to: "+14155550100".to_string(),
            voice_url: "https://x/twilio/voice?session_id=s1".to_string(),
            status_callback_url: "https://x/twilio/status?session_id=s1".to_string(),
        };
        let form = client.form(&request);

        assert!(form.contains(&("To", "+14155550100")));
        assert!(form.contains(&("From", "+15005550006")));
        let events: Vec<_> = form
            .iter()
            .filter(|(k, _)| *k == "StatusCallbackEvent")
            .map(|(_, v)| *v)
            .collect();
        assert_eq!(events, vec!["initiated", "ringing", "answered", "completed"]);
    }

    #[test]
    fn test_error_message() {
        let body = r#"{
            "code": 21211,
            "message": "The 'To' number is not a valid phone number.",
            "status": 400
        }"#;
        assert_eq!(
            error_message(body),
            "The 'To' number is not a valid phone number."
        );
        assert_eq!(error_message("<html>oops</html>"), "<html>oops</html>");
    }
}

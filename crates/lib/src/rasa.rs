//! Rasa server HTTP client (http://localhost:5005 by default).
//!
//! Two calls: a version probe for reachability checks and the REST webhook
//! that relays one user message. Neither is retried.

use crate::gateway::protocol::{BotReply, WebhookPayload};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:5005";

/// Timeout for the version/health probe.
const STATUS_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout for one webhook relay round-trip.
const RELAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Rasa HTTP API.
#[derive(Clone)]
pub struct RasaClient {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, thiserror::Error)]
pub enum RasaError {
    /// Transport failure: unreachable server, timeout, bad response body.
    #[error("rasa request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("rasa server returned status {status}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },
}

impl RasaClient {
    pub fn new(base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// GET /api/version — reachability probe.
    pub async fn version(&self) -> Result<serde_json::Value, RasaError> {
        let url = format!("{}/api/version", self.base_url);
        let res = self.client.get(&url).timeout(STATUS_TIMEOUT).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RasaError::Api { status, body });
        }
        Ok(res.json().await?)
    }

    /// POST /webhooks/rest/webhook — relay one user message, returning the
    /// bot's replies in the order the server produced them.
    pub async fn send_message(
        &self,
        sender: &str,
        message: &str,
    ) -> Result<Vec<BotReply>, RasaError> {
        let url = format!("{}/webhooks/rest/webhook", self.base_url);
        let payload = WebhookPayload {
            sender: sender.to_string(),
            message: message.to_string(),
        };
        let res = self
            .client
            .post(&url)
            .timeout(RELAY_TIMEOUT)
            .json(&payload)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(RasaError::Api { status, body });
        }
        Ok(res.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let client = RasaClient::new(Some("http://rasa.example:5005/".to_string()));
        assert_eq!(client.base_url, "http://rasa.example:5005");
    }

    #[test]
    fn missing_base_url_falls_back_to_default() {
        let client = RasaClient::new(None);
        assert_eq!(client.base_url, DEFAULT_BASE_URL);
    }
}

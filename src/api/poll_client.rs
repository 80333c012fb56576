use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CollectorError;

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Client for the betting poll API
pub struct PollClient {
    client: Client,
    url: String,
}

impl PollClient {
    /// Create a new poll client for a single poll endpoint
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Endpoint this client polls
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the raw poll payload
    pub async fn fetch_poll(&self) -> std::result::Result<Value, CollectorError> {
        debug!("Fetching poll from: {}", self.url);

        let response = self.client.get(&self.url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Poll API error: {} - {}", status, body);
            return Err(CollectorError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response.json().await?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_url() {
        let client = PollClient::new(
            "https://api.real.vg/polls/270619",
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(client.url(), "https://api.real.vg/polls/270619");
    }
}

//! HTTP client for the input relay.
//!
//! Endpoints:
//! - POST /nonce
//! - POST /submit

use alloy_primitives::Address;
use async_trait::async_trait;
use rollups_types::{Result, RollupsError};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tracing::*;

use crate::{InputRelay, NonceRequest, NonceResponse, SubmitRequest, SubmitResponse};

pub struct RelayClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl RelayClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let resp = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RollupsError::Relay(format!("relay request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(RollupsError::Relay(format!(
                "relay returned status {}: {}",
                status, body
            )));
        }

        resp.json()
            .await
            .map_err(|e| RollupsError::Relay(format!("failed to parse relay response: {}", e)))
    }
}

#[async_trait]
impl InputRelay for RelayClient {
    /// Next relay nonce of `msg_sender` for `app_contract`.
    ///
    /// POST /nonce
    async fn fetch_nonce(&self, msg_sender: Address, app_contract: Address) -> Result<u64> {
        let body = NonceRequest { msg_sender, app_contract };
        let resp: NonceResponse = self.post("/nonce", &body).await?;
        debug!(%msg_sender, %app_contract, nonce = resp.nonce, "relay nonce");
        Ok(resp.nonce)
    }

    /// Submit a signed message; returns the relay's id for it.
    ///
    /// POST /submit
    async fn submit(&self, request: &SubmitRequest) -> Result<String> {
        let resp: SubmitResponse = self.post("/submit", request).await?;
        let id = resp.id_string();
        info!(account = %request.account, %id, "relay accepted input");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = RelayClient::new("http://localhost:8080/", None);
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_relay_error() {
        let client = RelayClient::new("http://127.0.0.1:9", Some(500));
        let err = client
            .fetch_nonce(Address::with_last_byte(1), Address::with_last_byte(2))
            .await
            .unwrap_err();
        assert!(matches!(err, RollupsError::Relay(_)));
        assert!(err.is_retryable());
    }
}

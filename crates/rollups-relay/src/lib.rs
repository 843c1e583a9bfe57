//! Off-chain input relay.
//!
//! - Fetch the sender's next nonce for an application
//! - Submit a wallet-signed `CartesiMessage` for sequencing

use alloy_primitives::{Address, Bytes};
use async_trait::async_trait;
use rollups_abi::typed_data::TypedDataEnvelope;
use rollups_types::Result;
use serde::{Deserialize, Serialize};

pub mod relay_client;

pub use relay_client::RelayClient;

/// An off-chain input relay.
#[async_trait]
pub trait InputRelay: Send + Sync {
    /// Next nonce of `msg_sender` for `app_contract`.
    async fn fetch_nonce(&self, msg_sender: Address, app_contract: Address) -> Result<u64>;

    /// Returns the relay's id for the accepted message.
    async fn submit(&self, request: &SubmitRequest) -> Result<String>;
}

/// Body of `POST /nonce`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceRequest {
    pub msg_sender: Address,
    pub app_contract: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NonceResponse {
    pub nonce: u64,
}

/// Body of `POST /submit`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub typed_data: TypedDataEnvelope,
    pub account: Address,
    pub signature: Bytes,
}

/// Relay acknowledgement. Some relays return a numeric id.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub id: serde_json::Value,
}

impl SubmitResponse {
    pub fn id_string(&self) -> String {
        match &self.id {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

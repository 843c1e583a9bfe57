//! JSON-RPC client for a chain node.
//!
//! Methods used:
//! - `eth_call`
//! - `eth_getTransactionReceipt`
//! - `eth_blockNumber`

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use rollups_abi::revert_reason;
use rollups_types::{hex_to_bytes, ClientConfig, Result, RollupsError, TxReceipt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::*;

use crate::ChainReader;

/// JSON-RPC error code nodes use for reverted calls.
const EXECUTION_REVERTED: i64 = 3;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: B256,
    block_number: Option<U64>,
    status: Option<U64>,
}

/// Map a JSON-RPC error to the crate error, decoding revert data.
pub(crate) fn map_rpc_error(err: RpcErrorObject) -> RollupsError {
    let data = match err.data {
        Some(Value::String(ref hex)) => hex_to_bytes(hex).ok().map(Bytes::from),
        Some(Value::Object(ref obj)) => obj
            .get("data")
            .and_then(Value::as_str)
            .and_then(|hex| hex_to_bytes(hex).ok())
            .map(Bytes::from),
        _ => None,
    };
    let reverted = err.code == EXECUTION_REVERTED || err.message.contains("revert");
    if !reverted {
        return RollupsError::Rpc { code: err.code, message: err.message };
    }
    let message = data
        .as_ref()
        .and_then(|d| revert_reason(d))
        .unwrap_or_else(|| err.message.clone());
    RollupsError::Reverted { message, data }
}

/// Unwrap a JSON-RPC response body.
pub(crate) fn parse_response<T: DeserializeOwned>(body: Value) -> Result<Option<T>> {
    let resp: RpcResponse<T> = serde_json::from_value(body)
        .map_err(|e| RollupsError::Transport(format!("malformed rpc response: {}", e)))?;
    if let Some(err) = resp.error {
        return Err(map_rpc_error(err));
    }
    Ok(resp.result)
}

fn parse_receipt(raw: RawReceipt) -> Option<TxReceipt> {
    let block_number = raw.block_number?.to::<u64>();
    Some(TxReceipt {
        transaction_hash: raw.transaction_hash,
        block_number,
        success: raw.status.map_or(true, |s| s == U64::from(1)),
    })
}

/// HTTP JSON-RPC transport shared by the node and wallet clients.
pub struct RpcTransport {
    url: String,
    client: reqwest::Client,
    timeout: Duration,
    next_id: AtomicU64,
}

impl RpcTransport {
    pub fn new(url: &str, timeout_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one request; `Ok(None)` when the node returns a null result.
    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<Option<T>> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RollupsError::Transport(format!("{} request failed: {}", method, e)))?;

        if !resp.status().is_success() {
            return Err(RollupsError::Transport(format!(
                "{} returned status {}",
                method,
                resp.status()
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| RollupsError::Transport(format!("failed to parse {} response: {}", method, e)))?;

        parse_response(body)
    }
}

/// Read-only client for one chain node.
pub struct RpcClient {
    chain_id: u64,
    transport: RpcTransport,
    poll_interval: Duration,
    max_polls: u32,
}

impl RpcClient {
    pub fn new(chain_id: u64, rpc_url: &str, config: &ClientConfig) -> Self {
        Self {
            chain_id,
            transport: RpcTransport::new(rpc_url, config.request_timeout_ms),
            poll_interval: Duration::from_millis(config.receipt_poll_ms),
            max_polls: config.receipt_max_polls,
        }
    }

    pub async fn block_number(&self) -> Result<u64> {
        let head: Option<U64> = self.transport.request("eth_blockNumber", json!([])).await?;
        head.map(|n| n.to::<u64>())
            .ok_or_else(|| RollupsError::Transport("eth_blockNumber returned null".into()))
    }

    pub async fn get_receipt(&self, tx_hash: B256) -> Result<Option<TxReceipt>> {
        let raw: Option<RawReceipt> = self
            .transport
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        Ok(raw.and_then(parse_receipt))
    }
}

#[async_trait]
impl ChainReader for RpcClient {
    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        debug!(chain_id = self.chain_id, %to, "eth_call");
        let ret: Option<Bytes> = self
            .transport
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await?;
        Ok(ret.unwrap_or_default())
    }

    async fn wait_for_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<TxReceipt> {
        let confirmations = confirmations.max(1);
        for attempt in 0..self.max_polls {
            if let Some(receipt) = self.get_receipt(tx_hash).await? {
                if !receipt.success {
                    return Err(RollupsError::Reverted {
                        message: format!("transaction {} reverted", tx_hash),
                        data: None,
                    });
                }
                let head = self.block_number().await?;
                if head + 1 >= receipt.block_number + confirmations {
                    debug!(%tx_hash, block = receipt.block_number, "transaction confirmed");
                    return Ok(receipt);
                }
            }
            if attempt + 1 < self.max_polls {
                tokio::time::sleep(self.poll_interval).await;
            }
        }
        Err(RollupsError::Transport(format!(
            "receipt for {} not available after {} polls",
            tx_hash, self.max_polls
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolError;
    use rollups_abi::bindings::IApplication;

    #[test]
    fn test_parse_result() {
        let body = json!({ "jsonrpc": "2.0", "id": 1, "result": "0x0102" });
        let ret: Option<Bytes> = parse_response(body).unwrap();
        assert_eq!(ret.unwrap(), Bytes::from_static(&[1, 2]));

        let body = json!({ "jsonrpc": "2.0", "id": 1, "result": null });
        let ret: Option<Bytes> = parse_response(body).unwrap();
        assert!(ret.is_none());
    }

    #[test]
    fn test_revert_with_application_error_data() {
        let data = IApplication::InvalidOutputHashesSiblingsArrayLength {}.abi_encode();
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 3,
                "message": "execution reverted",
                "data": rollups_types::bytes_to_hex(&data)
            }
        });

        match parse_response::<Bytes>(body).unwrap_err() {
            RollupsError::Reverted { message, data: Some(raw) } => {
                assert_eq!(message, "InvalidOutputHashesSiblingsArrayLength");
                assert_eq!(raw.as_ref(), data.as_slice());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_revert_without_data_keeps_node_message() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "execution reverted" }
        });
        match parse_response::<Bytes>(body).unwrap_err() {
            RollupsError::Reverted { message, data } => {
                assert_eq!(message, "execution reverted");
                assert!(data.is_none());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_other_rpc_error() {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 4001, "message": "User rejected the request." }
        });
        assert!(matches!(
            parse_response::<Bytes>(body).unwrap_err(),
            RollupsError::Rpc { code: 4001, .. }
        ));
    }

    #[test]
    fn test_parse_receipt() {
        let raw: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": "0x10",
            "status": "0x0"
        }))
        .unwrap();
        let receipt = parse_receipt(raw).unwrap();
        assert_eq!(receipt.block_number, 16);
        assert!(!receipt.success);

        let pending: RawReceipt = serde_json::from_value(json!({
            "transactionHash": format!("0x{}", "11".repeat(32)),
            "blockNumber": null
        }))
        .unwrap();
        assert!(parse_receipt(pending).is_none());
    }
}

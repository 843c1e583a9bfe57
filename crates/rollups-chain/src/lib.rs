//! Chain access for the rollups front end.
//!
//! Two seams, both explicit context for every operation:
//! - [`ChainReader`]: read-only calls and receipt polling against one chain
//! - [`WalletClient`]: the connected wallet, which signs and sends
//!
//! The JSON-RPC implementations talk to a node (`RpcClient`) and to a
//! wallet endpoint (`RpcWallet`) over HTTP.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use rollups_types::{ChainConfig, ClientConfig, Result, TxReceipt, TxRequest};
use serde_json::Value;

pub mod rpc;
pub mod wallet;

pub use rpc::RpcClient;
pub use wallet::RpcWallet;

/// Read access to one chain.
#[async_trait]
pub trait ChainReader: Send + Sync {
    fn chain_id(&self) -> u64;

    /// `eth_call` against the latest block.
    ///
    /// A revert surfaces as `RollupsError::Reverted` with the decoded reason
    /// as its message.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Wait until `tx_hash` is mined and `confirmations` blocks deep.
    async fn wait_for_receipt(&self, tx_hash: B256, confirmations: u64) -> Result<TxReceipt>;
}

/// The connected wallet.
#[async_trait]
pub trait WalletClient: Send + Sync {
    /// The currently selected account.
    async fn account(&self) -> Result<Address>;

    /// Sign and broadcast; returns the transaction hash.
    async fn send_transaction(&self, tx: TxRequest) -> Result<B256>;

    /// `eth_signTypedData_v4` over a JSON typed-data envelope.
    async fn sign_typed_data(&self, account: Address, typed_data: &Value) -> Result<Bytes>;
}

/// Resolves the read client of a chain.
pub trait ReaderFactory: Send + Sync {
    fn reader(&self, chain: &ChainConfig) -> Arc<dyn ChainReader>;
}

/// One shared [`RpcClient`] per chain id, created on first use.
pub struct RpcReaderPool {
    config: ClientConfig,
    readers: Mutex<HashMap<u64, Arc<RpcClient>>>,
}

impl RpcReaderPool {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            readers: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for RpcReaderPool {
    fn default() -> Self {
        Self::new(ClientConfig::default())
    }
}

impl ReaderFactory for RpcReaderPool {
    fn reader(&self, chain: &ChainConfig) -> Arc<dyn ChainReader> {
        let mut readers = self.readers.lock().unwrap_or_else(|e| e.into_inner());
        let reader = readers
            .entry(chain.chain_id)
            .or_insert_with(|| Arc::new(RpcClient::new(chain.chain_id, &chain.rpc_url, &self.config)))
            .clone();
        reader
    }
}

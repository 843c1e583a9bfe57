//! Wallet client over a JSON-RPC endpoint that holds the user's keys
//! (browser-extension bridge, or a dev node with unlocked accounts).
//!
//! Methods used:
//! - `eth_requestAccounts` / `eth_accounts`
//! - `eth_sendTransaction`
//! - `eth_signTypedData_v4`

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use rollups_types::{ClientConfig, Result, RollupsError, TxRequest};
use serde_json::{json, Value};
use tracing::*;

use crate::rpc::RpcTransport;
use crate::WalletClient;

pub struct RpcWallet {
    transport: RpcTransport,
    /// Pinned account; otherwise the wallet's first account is used.
    account: Option<Address>,
}

impl RpcWallet {
    pub fn new(wallet_url: &str, config: &ClientConfig) -> Self {
        Self {
            transport: RpcTransport::new(wallet_url, config.request_timeout_ms),
            account: None,
        }
    }

    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        match self
            .transport
            .request::<Vec<Address>>("eth_requestAccounts", json!([]))
            .await
        {
            Ok(accounts) => Ok(accounts.unwrap_or_default()),
            // plain nodes do not implement eth_requestAccounts
            Err(RollupsError::Rpc { .. }) => Ok(self
                .transport
                .request::<Vec<Address>>("eth_accounts", json!([]))
                .await?
                .unwrap_or_default()),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl WalletClient for RpcWallet {
    async fn account(&self) -> Result<Address> {
        if let Some(account) = self.account {
            return Ok(account);
        }
        self.accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RollupsError::Configuration("wallet exposes no account".into()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256> {
        let tx = match tx.from {
            Some(_) => tx,
            None => {
                let from = self.account().await?;
                tx.with_from(from)
            }
        };
        info!(url = self.transport.url(), to = %tx.to, value = %tx.value, "sending transaction");
        self.transport
            .request::<B256>("eth_sendTransaction", json!([tx]))
            .await?
            .ok_or_else(|| RollupsError::Transport("eth_sendTransaction returned null".into()))
    }

    async fn sign_typed_data(&self, account: Address, typed_data: &Value) -> Result<Bytes> {
        let payload = serde_json::to_string(typed_data)
            .map_err(|e| RollupsError::Other(format!("typed data not serializable: {}", e)))?;
        self.transport
            .request::<Bytes>("eth_signTypedData_v4", json!([account, payload]))
            .await?
            .ok_or_else(|| RollupsError::Transport("eth_signTypedData_v4 returned null".into()))
    }
}

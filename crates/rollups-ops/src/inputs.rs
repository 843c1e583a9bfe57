//! Input submission and portal deposits.
//!
//! Reads the current allowance / approval, plans with `rollups-portal`, then
//! sends through the connected wallet. An approval is confirmed before the
//! deposit that depends on it is sent.

use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256, U256};
use rollups_abi::RelayTypedData;
use rollups_chain::{ChainReader, ReaderFactory, RpcReaderPool, WalletClient};
use rollups_portal::{
    decode_erc1155_approved_for_all, decode_erc20_allowance, decode_erc721_approved,
    erc1155_approved_for_all_call, erc20_allowance_call, erc721_approved_call, plan_add_input,
    plan_erc1155_batch_deposit, plan_erc1155_single_deposit, plan_erc20_deposit,
    plan_erc721_deposit, plan_ether_deposit, DepositPlan, Erc1155Batch, InputPayload,
};
use rollups_relay::{InputRelay, RelayClient, SubmitRequest};
use rollups_store::{AppKey, OperationKind, OperationStatus, VoucherStore};
use rollups_types::{ChainConfig, ChainRegistry, ClientConfig, Result, RollupsError, TxRequest};
use serde_json::json;
use tracing::*;

use crate::new_operation;

/// Transactions sent for one deposit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositReceipt {
    pub approval: Option<B256>,
    pub deposit: B256,
}

pub struct InputManager {
    registry: ChainRegistry,
    readers: Arc<dyn ReaderFactory>,
    store: Arc<dyn VoucherStore>,
    config: ClientConfig,
}

impl InputManager {
    pub fn new(
        registry: ChainRegistry,
        readers: Arc<dyn ReaderFactory>,
        store: Arc<dyn VoucherStore>,
        config: ClientConfig,
    ) -> Self {
        Self { registry, readers, store, config }
    }

    pub fn with_rpc(registry: ChainRegistry, store: Arc<dyn VoucherStore>, config: ClientConfig) -> Self {
        let readers = Arc::new(RpcReaderPool::new(config.clone()));
        Self::new(registry, readers, store, config)
    }

    fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.registry.resolve(chain_id)
    }

    fn reader(&self, chain: &ChainConfig) -> Arc<dyn ChainReader> {
        self.readers.reader(chain)
    }

    /// HTTP relay client of `chain_id`.
    pub fn relay(&self, chain_id: u64) -> Result<RelayClient> {
        let base_url = self.chain(chain_id)?.relay_base_url()?;
        Ok(RelayClient::new(base_url, Some(self.config.request_timeout_ms)))
    }

    async fn record<T>(
        &self,
        key: AppKey,
        kind: OperationKind,
        result: &Result<T>,
        tx_hash: Option<B256>,
        message: String,
        data: serde_json::Value,
    ) {
        let (status, message) = match result {
            Ok(_) => (OperationStatus::Succeeded, message),
            Err(e) => {
                warn!(chain_id = key.chain_id, app = %key.app, ?kind, error = %e, "input operation failed");
                (OperationStatus::Failed, e.to_string())
            }
        };
        let op = new_operation(key, kind, status, tx_hash, message, data);
        if let Err(e) = self.store.create_operation(&op).await {
            warn!(
                chain_id = key.chain_id,
                app = %key.app,
                ?kind,
                ?tx_hash,
                error = %e,
                "operation not recorded"
            );
        }
    }

    /// `InputBox.addInput`; returns the transaction hash.
    pub async fn add_input(
        &self,
        key: AppKey,
        payload: &InputPayload,
        wallet: &dyn WalletClient,
    ) -> Result<B256> {
        let result = async {
            let chain = self.chain(key.chain_id)?;
            let data = payload.encode()?;
            let tx = plan_add_input(&chain.contracts, key.app, data);
            wallet.send_transaction(tx).await
        }
        .await;

        let tx_hash = result.as_ref().ok().copied();
        let message = tx_hash.map(|h| format!("Input sent: {}", h)).unwrap_or_default();
        self.record(key, OperationKind::AddInput, &result, tx_hash, message, json!({})).await;
        if let Some(hash) = tx_hash {
            info!(chain_id = key.chain_id, app = %key.app, tx_hash = %hash, "input added");
        }
        result
    }

    /// Sign a `CartesiMessage` and hand it to `relay`; returns the relay's id.
    ///
    /// `namespace` replaces the application address when given.
    pub async fn submit_relay_input(
        &self,
        key: AppKey,
        namespace: Option<Address>,
        payload: &InputPayload,
        wallet: &dyn WalletClient,
        relay: &dyn InputRelay,
    ) -> Result<String> {
        let app = namespace.unwrap_or(key.app);
        let result = async {
            self.chain(key.chain_id)?;
            let data = payload.encode()?;
            let account = wallet.account().await?;
            let nonce = relay.fetch_nonce(account, app).await?;

            let typed = RelayTypedData::new(key.chain_id, app, nonce, self.config.relay_max_gas_price, data);
            let envelope = typed.envelope();
            let json = serde_json::to_value(&envelope)
                .map_err(|e| RollupsError::Other(format!("typed data not serializable: {}", e)))?;
            let signature = wallet.sign_typed_data(account, &json).await?;

            relay
                .submit(&SubmitRequest { typed_data: envelope, account, signature })
                .await
        }
        .await;

        let message = result.as_ref().map(|id| format!("Relay id: {}", id)).unwrap_or_default();
        self.record(key, OperationKind::RelayInput, &result, None, message, json!({ "app": app }))
            .await;
        result
    }

    async fn run_plan(
        &self,
        reader: &dyn ChainReader,
        plan: DepositPlan,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let approval = match plan.approval {
            Some(tx) => {
                let hash = wallet.send_transaction(tx).await?;
                debug!(tx_hash = %hash, "waiting for portal approval");
                let receipt = reader.wait_for_receipt(hash, 1).await?;
                if !receipt.success {
                    return Err(RollupsError::Reverted {
                        message: format!("approval {} reverted", hash),
                        data: None,
                    });
                }
                Some(hash)
            }
            None => None,
        };
        let deposit = wallet.send_transaction(plan.deposit).await?;
        Ok(DepositReceipt { approval, deposit })
    }

    async fn deposit(
        &self,
        key: AppKey,
        wallet: &dyn WalletClient,
        what: String,
        plan: impl std::future::Future<Output = Result<(Arc<dyn ChainReader>, DepositPlan)>>,
    ) -> Result<DepositReceipt> {
        let result = async {
            let (reader, plan) = plan.await?;
            self.run_plan(reader.as_ref(), plan, wallet).await
        }
        .await;

        let tx_hash = result.as_ref().ok().map(|r| r.deposit);
        self.record(key, OperationKind::Deposit, &result, tx_hash, what.clone(), json!({})).await;
        if let Ok(ref receipt) = result {
            info!(chain_id = key.chain_id, app = %key.app, deposit = %receipt.deposit, "{}", what);
        }
        result
    }

    async fn read(&self, reader: &dyn ChainReader, call: TxRequest) -> Result<Bytes> {
        reader.call(call.to, call.data).await
    }

    pub async fn deposit_ether(
        &self,
        key: AppKey,
        amount: U256,
        exec_data: Option<Bytes>,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let plan = async {
            let chain = self.chain(key.chain_id)?;
            let plan = plan_ether_deposit(&chain.contracts, key.app, amount, exec_data);
            Ok::<_, RollupsError>((self.reader(chain), plan))
        };
        self.deposit(key, wallet, format!("Deposited {} wei", amount), plan).await
    }

    pub async fn deposit_erc20(
        &self,
        key: AppKey,
        token: Address,
        amount: U256,
        exec_data: Option<Bytes>,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let plan = async {
            let chain = self.chain(key.chain_id)?;
            let reader = self.reader(chain);
            let owner = wallet.account().await?;
            let ret = self
                .read(reader.as_ref(), erc20_allowance_call(&chain.contracts, token, owner))
                .await?;
            let allowance = decode_erc20_allowance(&ret)?;
            let plan = plan_erc20_deposit(&chain.contracts, key.app, token, amount, allowance, exec_data);
            Ok::<_, RollupsError>((reader, plan))
        };
        self.deposit(key, wallet, format!("Deposited {} of ERC20 {}", amount, token), plan).await
    }

    pub async fn deposit_erc721(
        &self,
        key: AppKey,
        token: Address,
        id: U256,
        exec_data: Option<Bytes>,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let plan = async {
            let chain = self.chain(key.chain_id)?;
            let reader = self.reader(chain);
            let ret = self.read(reader.as_ref(), erc721_approved_call(token, id)).await?;
            let approved = decode_erc721_approved(&ret)?;
            let plan = plan_erc721_deposit(&chain.contracts, key.app, token, id, approved, exec_data);
            Ok::<_, RollupsError>((reader, plan))
        };
        self.deposit(key, wallet, format!("Deposited id {} of ERC721 {}", id, token), plan).await
    }

    pub async fn deposit_erc1155_single(
        &self,
        key: AppKey,
        token: Address,
        id: U256,
        amount: U256,
        exec_data: Option<Bytes>,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let plan = async {
            let chain = self.chain(key.chain_id)?;
            let reader = self.reader(chain);
            let owner = wallet.account().await?;
            let portal = chain.contracts.erc1155_single_portal;
            let ret = self
                .read(reader.as_ref(), erc1155_approved_for_all_call(token, owner, portal))
                .await?;
            let approved = decode_erc1155_approved_for_all(&ret)?;
            let plan = plan_erc1155_single_deposit(
                &chain.contracts,
                key.app,
                token,
                id,
                amount,
                approved,
                exec_data,
            );
            Ok::<_, RollupsError>((reader, plan))
        };
        let what = format!("Deposited {} of id {} of ERC1155 {}", amount, id, token);
        self.deposit(key, wallet, what, plan).await
    }

    pub async fn deposit_erc1155_batch(
        &self,
        key: AppKey,
        token: Address,
        batch: &Erc1155Batch,
        exec_data: Option<Bytes>,
        wallet: &dyn WalletClient,
    ) -> Result<DepositReceipt> {
        let plan = async {
            let chain = self.chain(key.chain_id)?;
            let reader = self.reader(chain);
            let owner = wallet.account().await?;
            let portal = chain.contracts.erc1155_batch_portal;
            let ret = self
                .read(reader.as_ref(), erc1155_approved_for_all_call(token, owner, portal))
                .await?;
            let approved = decode_erc1155_approved_for_all(&ret)?;
            let plan =
                plan_erc1155_batch_deposit(&chain.contracts, key.app, token, batch, approved, exec_data)?;
            Ok::<_, RollupsError>((reader, plan))
        };
        let what = format!("Deposited {} ids of ERC1155 {}", batch.len(), token);
        self.deposit(key, wallet, what, plan).await
    }
}

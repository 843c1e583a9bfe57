//! In-process fakes for the chain, wallet, indexer and relay seams.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{address, Address, Bytes, B256, U256};
use alloy_sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use rollups_abi::bindings::IApplication;
use rollups_chain::{ChainReader, ReaderFactory, WalletClient};
use rollups_indexer::{RepositoryFactory, VoucherRepository};
use rollups_relay::{InputRelay, SubmitRequest};
use rollups_store::{
    AppKey, ExecutionState, MemoryStore, StoredOperation, Transition, VoucherStore,
};
use rollups_types::{
    ChainConfig, OutputProof, Result, RollupsError, TxReceipt, TxRequest, VoucherDetail,
    VoucherSummary,
};
use serde_json::Value;

pub const DEVNET: u64 = 31_337;
pub const ACCOUNT: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

pub fn app() -> Address {
    Address::repeat_byte(0x0a)
}

pub fn summary(index: u64, payload: &[u8]) -> VoucherSummary {
    VoucherSummary {
        index,
        destination: Address::repeat_byte(0x0d),
        value: U256::ZERO,
        payload: Bytes::copy_from_slice(payload),
        input: None,
    }
}

pub fn proven(index: u64) -> VoucherDetail {
    VoucherDetail {
        summary: summary(index, &[0xde, 0xad, 0xbe, 0xef, 0x01]),
        proof: Some(OutputProof {
            output_index: index,
            output_hashes_siblings: vec![B256::repeat_byte(1), B256::repeat_byte(2)],
        }),
        executed: false,
    }
}

pub fn unproven(index: u64) -> VoucherDetail {
    VoucherDetail { proof: None, ..proven(index) }
}

/// A chain with one application; also acts as the connected wallet.
#[derive(Default)]
pub struct FakeChain {
    pub calls: AtomicUsize,
    pub sent: Mutex<Vec<TxRequest>>,
    pub signed: Mutex<Vec<Value>>,
    pub receipts_waited: AtomicUsize,
    executed: Mutex<HashSet<u64>>,
    responses: Mutex<HashMap<[u8; 4], Bytes>>,
    validate_revert: Mutex<Option<String>>,
    send_failure: Mutex<Option<String>>,
    receipt_reverts: Mutex<bool>,
    yield_receipts: AtomicBool,
}

impl FakeChain {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_executed(&self, index: u64) {
        self.executed.lock().unwrap().insert(index);
    }

    pub fn respond(&self, selector: [u8; 4], ret: Vec<u8>) {
        self.responses.lock().unwrap().insert(selector, ret.into());
    }

    pub fn revert_validation(&self, reason: &str) {
        *self.validate_revert.lock().unwrap() = Some(reason.to_string());
    }

    pub fn fail_sends(&self, reason: &str) {
        *self.send_failure.lock().unwrap() = Some(reason.to_string());
    }

    pub fn revert_receipts(&self) {
        *self.receipt_reverts.lock().unwrap() = true;
    }

    /// Give other futures a turn before every receipt resolves.
    pub fn yield_on_receipts(&self) {
        self.yield_receipts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChainReader for FakeChain {
    fn chain_id(&self) -> u64 {
        DEVNET
    }

    async fn call(&self, _to: Address, data: Bytes) -> Result<Bytes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let selector: [u8; 4] = data
            .get(..4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| RollupsError::Transport("short calldata".into()))?;

        if selector == IApplication::validateOutputCall::SELECTOR {
            return match self.validate_revert.lock().unwrap().clone() {
                Some(message) => Err(RollupsError::Reverted { message, data: None }),
                None => Ok(Bytes::new()),
            };
        }
        if selector == IApplication::wasOutputExecutedCall::SELECTOR {
            let call = IApplication::wasOutputExecutedCall::abi_decode(&data, true)
                .map_err(|e| RollupsError::Abi(e.to_string()))?;
            let index = call.outputIndex.to::<u64>();
            let executed = self.executed.lock().unwrap().contains(&index);
            return Ok(executed.abi_encode().into());
        }
        self.responses
            .lock()
            .unwrap()
            .get(&selector)
            .cloned()
            .ok_or_else(|| RollupsError::Transport("no response configured".into()))
    }

    async fn wait_for_receipt(&self, tx_hash: B256, _confirmations: u64) -> Result<TxReceipt> {
        self.receipts_waited.fetch_add(1, Ordering::SeqCst);
        if self.yield_receipts.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        if *self.receipt_reverts.lock().unwrap() {
            return Err(RollupsError::Reverted {
                message: format!("transaction {} reverted", tx_hash),
                data: None,
            });
        }
        Ok(TxReceipt { transaction_hash: tx_hash, block_number: 7, success: true })
    }
}

#[async_trait]
impl WalletClient for FakeChain {
    async fn account(&self) -> Result<Address> {
        Ok(ACCOUNT)
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<B256> {
        if let Some(message) = self.send_failure.lock().unwrap().clone() {
            return Err(RollupsError::Rpc { code: 4001, message });
        }
        if let Ok(call) = IApplication::executeOutputCall::abi_decode(&tx.data, true) {
            self.executed.lock().unwrap().insert(call.proof.outputIndex);
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(tx);
        Ok(B256::with_last_byte(sent.len() as u8))
    }

    async fn sign_typed_data(&self, _account: Address, typed_data: &Value) -> Result<Bytes> {
        self.signed.lock().unwrap().push(typed_data.clone());
        Ok(Bytes::from_static(&[0x5e; 65]))
    }
}

pub struct FakeReaders(pub Arc<FakeChain>);

impl ReaderFactory for FakeReaders {
    fn reader(&self, _chain: &ChainConfig) -> Arc<dyn ChainReader> {
        self.0.clone()
    }
}

/// Indexer fake; `vouchers == None` makes listing fail.
#[derive(Default)]
pub struct FakeRepository {
    pub calls: AtomicUsize,
    pub vouchers: Mutex<Option<Vec<VoucherSummary>>>,
    pub details: Mutex<HashMap<u64, VoucherDetail>>,
}

impl FakeRepository {
    pub fn new(vouchers: Vec<VoucherSummary>) -> Arc<Self> {
        let repo = Self::default();
        *repo.vouchers.lock().unwrap() = Some(vouchers);
        Arc::new(repo)
    }

    pub fn with_detail(self: Arc<Self>, detail: VoucherDetail) -> Arc<Self> {
        self.details.lock().unwrap().insert(detail.index(), detail);
        self
    }

    pub fn go_down(&self) {
        *self.vouchers.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VoucherRepository for FakeRepository {
    async fn list_vouchers(&self) -> Result<Vec<VoucherSummary>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.vouchers
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| RollupsError::Repository("indexer unreachable".into()))
    }

    async fn get_voucher(&self, index: u64) -> Result<Option<VoucherDetail>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.details.lock().unwrap().get(&index).cloned())
    }
}

#[derive(Default)]
pub struct FakeRepositories {
    pub repo: Arc<FakeRepository>,
    pub endpoints: Mutex<Vec<String>>,
}

impl FakeRepositories {
    pub fn new(repo: Arc<FakeRepository>) -> Arc<Self> {
        Arc::new(Self { repo, endpoints: Mutex::new(Vec::new()) })
    }
}

impl RepositoryFactory for FakeRepositories {
    fn repository(&self, endpoint: &str) -> Arc<dyn VoucherRepository> {
        self.endpoints.lock().unwrap().push(endpoint.to_string());
        self.repo.clone()
    }
}

/// Relay fake handing out a fixed nonce.
pub struct FakeRelay {
    pub nonce: u64,
    pub nonce_requests: Mutex<Vec<(Address, Address)>>,
    pub submitted: Mutex<Vec<Value>>,
}

impl FakeRelay {
    pub fn new(nonce: u64) -> Self {
        Self { nonce, nonce_requests: Mutex::new(Vec::new()), submitted: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl InputRelay for FakeRelay {
    async fn fetch_nonce(&self, msg_sender: Address, app_contract: Address) -> Result<u64> {
        self.nonce_requests.lock().unwrap().push((msg_sender, app_contract));
        Ok(self.nonce)
    }

    async fn submit(&self, request: &SubmitRequest) -> Result<String> {
        let json = serde_json::to_value(request).map_err(|e| RollupsError::Other(e.to_string()))?;
        self.submitted.lock().unwrap().push(json);
        Ok("relay-1".to_string())
    }
}

/// Memory store whose operation history rejects every write.
#[derive(Default)]
pub struct HistoryDownStore(MemoryStore);

#[async_trait]
impl VoucherStore for HistoryDownStore {
    async fn replace_vouchers(&self, key: AppKey, vouchers: Vec<VoucherSummary>) -> Result<()> {
        self.0.replace_vouchers(key, vouchers).await
    }

    async fn list_vouchers(&self, key: AppKey) -> Result<Vec<VoucherSummary>> {
        self.0.list_vouchers(key).await
    }

    async fn set_selected(&self, key: AppKey, voucher: VoucherDetail) -> Result<()> {
        self.0.set_selected(key, voucher).await
    }

    async fn selected(&self, key: AppKey) -> Result<Option<VoucherDetail>> {
        self.0.selected(key).await
    }

    async fn mark_executed(&self, key: AppKey, index: u64) -> Result<bool> {
        self.0.mark_executed(key, index).await
    }

    async fn set_execution_state(&self, key: AppKey, index: u64, state: ExecutionState) -> Result<()> {
        self.0.set_execution_state(key, index, state).await
    }

    async fn execution_state(&self, key: AppKey, index: u64) -> Result<Option<ExecutionState>> {
        self.0.execution_state(key, index).await
    }

    async fn transition_execution_state(
        &self,
        key: AppKey,
        index: u64,
        accept: for<'s> fn(Option<&'s ExecutionState>) -> bool,
        next: ExecutionState,
    ) -> Result<Transition> {
        self.0.transition_execution_state(key, index, accept, next).await
    }

    async fn create_operation(&self, _op: &StoredOperation) -> Result<()> {
        Err(RollupsError::Other("history unavailable".into()))
    }

    async fn list_operations(&self, chain_id: Option<u64>) -> Result<Vec<StoredOperation>> {
        self.0.list_operations(chain_id).await
    }
}

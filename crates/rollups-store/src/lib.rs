//! Local voucher state for the rollups front end.
//!
//! Defines the `VoucherStore` trait that all storage backends must implement.
//! Provides a `MemoryStore` for the in-process case and for testing.
//!
//! Nothing here is authoritative: the voucher list is whatever the last
//! successful indexer load returned, and the `executed` flag of the selected
//! voucher is a cache until the next on-chain read replaces it.

use alloy_primitives::{Address, B256};
use async_trait::async_trait;
use rollups_types::{Result, VoucherDetail, VoucherSummary};
use serde::{Deserialize, Serialize};

pub mod memory;

pub use memory::MemoryStore;

/// One application on one chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AppKey {
    pub chain_id: u64,
    pub app: Address,
}

impl AppKey {
    pub fn new(chain_id: u64, app: Address) -> Self {
        Self { chain_id, app }
    }
}

/// Client-side progress of a voucher through validation and execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionState {
    Selected,
    Validating,
    /// `executeOutput` is being signed; no hash yet.
    Executing,
    Submitted { tx_hash: B256 },
    Confirmed { tx_hash: B256 },
    Failed { reason: String },
}

impl ExecutionState {
    /// Whether an execute action is in flight.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Executing | Self::Submitted { .. })
    }

    /// Whether a new execute action may start from `state`.
    pub fn accepts_execution(state: Option<&Self>) -> bool {
        !matches!(state, Some(s) if s.is_pending() || matches!(s, Self::Confirmed { .. }))
    }

    /// Whether validation may mark `state` as `Validating`.
    pub fn accepts_validation(state: Option<&Self>) -> bool {
        matches!(state, None | Some(Self::Selected | Self::Failed { .. }))
    }
}

/// Result of [`VoucherStore::transition_execution_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub previous: Option<ExecutionState>,
    pub applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    ValidateVoucher,
    ExecuteVoucher,
    AddInput,
    RelayInput,
    Deposit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationStatus {
    Succeeded,
    Failed,
}

/// Stored operation (user action history).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredOperation {
    pub id: String,
    pub chain_id: u64,
    pub app: Address,
    pub kind: OperationKind,
    pub status: OperationStatus,
    pub tx_hash: Option<B256>,
    /// User-facing message (validity verdict, relay id, failure reason).
    pub message: String,
    pub created_at: u64,
    pub data: serde_json::Value,
}

/// The core storage trait.
///
/// All methods are async to support both in-memory and persistent backends.
/// Each method is a single atomic step from the caller's point of view.
#[async_trait]
pub trait VoucherStore: Send + Sync {
    // --- Voucher list ---
    /// Replace the whole list for `key`; never merges.
    async fn replace_vouchers(&self, key: AppKey, vouchers: Vec<VoucherSummary>) -> Result<()>;
    async fn list_vouchers(&self, key: AppKey) -> Result<Vec<VoucherSummary>>;

    // --- Selected voucher ---
    async fn set_selected(&self, key: AppKey, voucher: VoucherDetail) -> Result<()>;
    async fn selected(&self, key: AppKey) -> Result<Option<VoucherDetail>>;

    /// Set the local `executed` flag of the selected voucher if it is `index`.
    ///
    /// Returns `true` when the flag changed.
    async fn mark_executed(&self, key: AppKey, index: u64) -> Result<bool>;

    // --- Execution state ---
    async fn set_execution_state(&self, key: AppKey, index: u64, state: ExecutionState) -> Result<()>;
    async fn execution_state(&self, key: AppKey, index: u64) -> Result<Option<ExecutionState>>;

    /// Set `next` only if `accept` holds for the current state, in one step.
    async fn transition_execution_state(
        &self,
        key: AppKey,
        index: u64,
        accept: for<'s> fn(Option<&'s ExecutionState>) -> bool,
        next: ExecutionState,
    ) -> Result<Transition>;

    // --- Operations ---
    async fn create_operation(&self, op: &StoredOperation) -> Result<()>;
    async fn list_operations(&self, chain_id: Option<u64>) -> Result<Vec<StoredOperation>>;
}

//! Voucher lifecycle and input orchestration.
//!
//! - `validator`: read-only proof validation against the application
//! - `executor`: `executeOutput` submission and confirmation
//! - `manager`: load / select / validate / execute with local state and events
//! - `inputs`: input box, relay and portal deposit flows
//! - `view`: display rows for the voucher table
//!
//! Chain, wallet, indexer and relay access all go through the seam traits of
//! their crates, so every flow here runs against in-process fakes in tests.

pub mod executor;
pub mod inputs;
pub mod manager;
pub mod validator;
pub mod view;

#[cfg(test)]
mod testing;

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, B256};
use rollups_store::{AppKey, OperationKind, OperationStatus, StoredOperation};
use rollups_types::Unavailability;
use serde::Serialize;

pub use executor::{execute_voucher, VoucherExecutor};
pub use inputs::{DepositReceipt, InputManager};
pub use manager::VoucherManager;
pub use validator::validate_voucher;
pub use view::VoucherView;

/// Result of a proof validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationVerdict {
    Valid,
    /// The verifier rejected the proof; carries the decoded reason.
    Invalid(String),
    Unavailable(Unavailability),
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// The user-facing line for this verdict.
    pub fn message(&self) -> String {
        match self {
            Self::Valid => "Voucher is Valid".to_string(),
            Self::Invalid(reason) => format!("Voucher is not valid: {}", reason),
            Self::Unavailable(what) => format!("Voucher cannot be validated: {}", what),
        }
    }
}

/// Result of an execute action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExecutionOutcome {
    Confirmed { tx_hash: B256, block_number: u64 },
    /// Signing, submission or confirmation failed; the voucher stays executable.
    Failed { reason: String, tx_hash: Option<B256> },
    Unavailable(Unavailability),
    /// Already executed on-chain (or locally confirmed); nothing was sent.
    AlreadyExecuted,
    /// Another execute action for this voucher is in flight; nothing was sent.
    Pending { tx_hash: Option<B256> },
}

impl ExecutionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Confirmed { .. } => "Voucher executed!".to_string(),
            Self::Failed { reason, .. } => format!("Could not execute voucher: {}", reason),
            Self::Unavailable(what) => format!("Voucher cannot be executed: {}", what),
            Self::AlreadyExecuted => "Voucher already executed".to_string(),
            Self::Pending { .. } => "Voucher execution already in progress".to_string(),
        }
    }
}

/// Lifecycle event for progress reporting.
#[derive(Debug, Clone)]
pub enum VoucherEvent {
    Loaded { chain_id: u64, app: Address, count: usize },
    Selected { chain_id: u64, index: u64, executed: bool },
    Validated { chain_id: u64, index: u64, verdict: ValidationVerdict },
    Submitted { chain_id: u64, index: u64, tx_hash: B256 },
    Confirmed { chain_id: u64, index: u64, tx_hash: B256 },
    Failed { chain_id: u64, message: String },
}

/// Callback type for voucher events.
pub type VoucherEventHandler = Box<dyn Fn(VoucherEvent) + Send + Sync>;

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

static NEXT_OPERATION: AtomicU64 = AtomicU64::new(1);

pub(crate) fn new_operation(
    key: AppKey,
    kind: OperationKind,
    status: OperationStatus,
    tx_hash: Option<B256>,
    message: String,
    data: serde_json::Value,
) -> StoredOperation {
    let created_at = now_secs();
    StoredOperation {
        id: format!("{}-{}", created_at, NEXT_OPERATION.fetch_add(1, Ordering::Relaxed)),
        chain_id: key.chain_id,
        app: key.app,
        kind,
        status,
        tx_hash,
        message,
        created_at,
        data,
    }
}

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod config;

pub use config::{ChainConfig, ChainRegistry, ClientConfig, RollupsContracts};

/// 0x-prefixed hex string (e.g. "0x1234...").
pub type Hex = String;

/// Rollups front-end error types.
#[derive(Debug, Error)]
pub enum RollupsError {
    /// No chain / endpoint mapping for the active chain.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Indexer query failed or returned malformed data.
    #[error("repository error: {0}")]
    Repository(String),

    #[error("validation failed: {0}")]
    ValidationFailure(String),

    #[error("execution failed: {0}")]
    ExecutionFailure(String),

    /// Missing payload or proof; an expected transient state.
    #[error("unavailable: {0}")]
    Unavailable(Unavailability),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("relay error: {0}")]
    Relay(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A call reverted; `data` carries the raw revert bytes when the node returns them.
    #[error("execution reverted: {message}")]
    Reverted { message: String, data: Option<Bytes> },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification used by callers to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Repository,
    Validation,
    Execution,
    Unavailable,
    Internal,
}

impl RollupsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Repository(_) | Self::Transport(_) | Self::Relay(_) => ErrorKind::Repository,
            Self::ValidationFailure(_) => ErrorKind::Validation,
            Self::ExecutionFailure(_) | Self::Reverted { .. } | Self::Rpc { .. } => {
                ErrorKind::Execution
            }
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::InvalidHex(_) | Self::Abi(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether a user-initiated retry (reload / re-click) can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Repository(_) | Self::Transport(_) | Self::Relay(_)
        )
    }

    /// Best-effort short message for a failed call: the decoded revert
    /// reason when one was attached, else the error's own message.
    pub fn short_message(&self) -> String {
        match self {
            Self::Reverted { message, .. } => message.clone(),
            Self::Rpc { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RollupsError>;

/// Why a voucher cannot be validated or executed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unavailability {
    MissingPayload,
    MissingProof,
}

impl std::fmt::Display for Unavailability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingPayload => f.write_str("no voucher"),
            Self::MissingProof => f.write_str("no proof"),
        }
    }
}

/// Back-reference to the input that produced an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    pub id: String,
    pub index: Option<u64>,
    pub payload: Bytes,
}

/// An emitted voucher as listed by the indexer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherSummary {
    pub index: u64,
    pub destination: Address,
    /// Native value attached to the call, in wei.
    pub value: U256,
    pub payload: Bytes,
    pub input: Option<InputRef>,
}

/// Inclusion proof of an output in a settled epoch.
///
/// Field order matches the on-chain `OutputValidityProof` struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputProof {
    pub output_index: u64,
    pub output_hashes_siblings: Vec<B256>,
}

/// A voucher with its (optional) proof and execution status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherDetail {
    #[serde(flatten)]
    pub summary: VoucherSummary,
    pub proof: Option<OutputProof>,
    /// Only authoritative when freshly read from the chain.
    pub executed: bool,
}

impl VoucherDetail {
    pub fn index(&self) -> u64 {
        self.summary.index
    }

    /// Payload and proof needed for `validateOutput` / `executeOutput`.
    pub fn provable_parts(&self) -> std::result::Result<(&Bytes, &OutputProof), Unavailability> {
        if self.summary.payload.is_empty() {
            return Err(Unavailability::MissingPayload);
        }
        match self.proof {
            Some(ref proof) if !proof.output_hashes_siblings.is_empty() => {
                Ok((&self.summary.payload, proof))
            }
            _ => Err(Unavailability::MissingProof),
        }
    }
}

/// A state-changing call to be signed and sent by the connected wallet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TxRequest {
    pub fn call(to: Address, data: Bytes) -> Self {
        Self { from: None, to, data, value: U256::ZERO }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    pub fn with_from(mut self, from: Address) -> Self {
        self.from = Some(from);
        self
    }
}

/// The parts of a transaction receipt the front end looks at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub success: bool,
}

/// Parse a hex string (with or without 0x) into bytes.
pub fn hex_to_bytes(hex_str: &str) -> Result<Vec<u8>> {
    let hex_str = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(hex_str).map_err(|e| RollupsError::InvalidHex(e.to_string()))
}

/// Convert bytes to a 0x-prefixed hex string.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse a 0x-prefixed hex quantity (as returned by indexers and JSON-RPC).
pub fn hex_to_u256(hex_str: &str) -> Result<U256> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 16).map_err(|e| RollupsError::InvalidHex(e.to_string()))
}

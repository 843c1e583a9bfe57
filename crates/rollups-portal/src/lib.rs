//! Transaction planning for inputs and portal deposits.
//!
//! - Input payload encoding (text or hex)
//! - `InputBox.addInput`
//! - Ether, ERC-20, ERC-721 and ERC-1155 (single, batch) deposits, each with
//!   the approval the portal needs when the current one is insufficient
//!
//! Everything here is pure. Allowance and approval state is read by the
//! caller and passed in; the returned plans are executed elsewhere.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use rollups_abi::bindings::{
    IERC1155, IERC1155BatchPortal, IERC1155SinglePortal, IERC20, IERC20Portal, IERC721,
    IERC721Portal, IEtherPortal, IInputBox,
};
use rollups_abi::format_ether;
use rollups_types::{hex_to_bytes, Result, RollupsContracts, RollupsError, TxRequest};

/// User-supplied input payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPayload {
    /// Sent as its UTF-8 bytes.
    Text(String),
    /// Hex digits, with or without `0x`.
    Hex(String),
}

impl InputPayload {
    pub fn encode(&self) -> Result<Bytes> {
        match self {
            Self::Text(text) => Ok(Bytes::copy_from_slice(text.as_bytes())),
            Self::Hex(hex) => Ok(hex_to_bytes(hex.trim())?.into()),
        }
    }
}

/// An optional approval followed by the deposit itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositPlan {
    /// Must be confirmed before `deposit` is sent.
    pub approval: Option<TxRequest>,
    pub deposit: TxRequest,
}

impl DepositPlan {
    pub fn needs_approval(&self) -> bool {
        self.approval.is_some()
    }
}

/// ERC-1155 batch under construction.
///
/// Ids and amounts always have the same length.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Erc1155Batch {
    ids: Vec<U256>,
    amounts: Vec<U256>,
}

impl Erc1155Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new batch with `(id, amount)` appended.
    #[must_use]
    pub fn with_entry(&self, id: U256, amount: U256) -> Self {
        let mut next = self.clone();
        next.ids.push(id);
        next.amounts.push(amount);
        next
    }

    pub fn ids(&self) -> &[U256] {
        &self.ids
    }

    pub fn amounts(&self) -> &[U256] {
        &self.amounts
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

fn join(values: &[U256]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(",")
}

// --- Default exec-layer messages ---

pub fn ether_deposit_message(amount: U256) -> Bytes {
    format!("Deposited ({}) ether.", format_ether(amount)).into_bytes().into()
}

pub fn erc20_deposit_message(token: Address, amount: U256) -> Bytes {
    format!("Deposited ({}) of ERC20 ({}).", format_ether(amount), token)
        .into_bytes()
        .into()
}

pub fn erc721_deposit_message(token: Address, id: U256) -> Bytes {
    format!("Deposited ({}) of ERC721 ({}).", id, token).into_bytes().into()
}

pub fn erc1155_single_deposit_message(token: Address, id: U256, amount: U256) -> Bytes {
    format!(
        "Deposited ({}) tokens from id ({}) of ERC1155 ({}).",
        amount, id, token
    )
    .into_bytes()
    .into()
}

pub fn erc1155_batch_deposit_message(token: Address, batch: &Erc1155Batch) -> Bytes {
    format!(
        "Deposited ({}) tokens from ids ({}) of ERC1155 ({}).",
        join(batch.amounts()),
        join(batch.ids()),
        token
    )
    .into_bytes()
    .into()
}

// --- Reads the caller performs before planning ---

/// `allowance(owner, erc20Portal)` on `token`.
pub fn erc20_allowance_call(contracts: &RollupsContracts, token: Address, owner: Address) -> TxRequest {
    let data = IERC20::allowanceCall { owner, spender: contracts.erc20_portal }.abi_encode();
    TxRequest::call(token, data.into())
}

pub fn decode_erc20_allowance(ret: &[u8]) -> Result<U256> {
    IERC20::allowanceCall::abi_decode_returns(ret, true)
        .map(|r| r._0)
        .map_err(|e| RollupsError::Abi(format!("allowance: {}", e)))
}

/// `getApproved(id)` on `token`.
pub fn erc721_approved_call(token: Address, id: U256) -> TxRequest {
    let data = IERC721::getApprovedCall { tokenId: id }.abi_encode();
    TxRequest::call(token, data.into())
}

pub fn decode_erc721_approved(ret: &[u8]) -> Result<Address> {
    IERC721::getApprovedCall::abi_decode_returns(ret, true)
        .map(|r| r._0)
        .map_err(|e| RollupsError::Abi(format!("getApproved: {}", e)))
}

/// `isApprovedForAll(owner, portal)` on `token`.
pub fn erc1155_approved_for_all_call(token: Address, owner: Address, portal: Address) -> TxRequest {
    let data = IERC1155::isApprovedForAllCall { account: owner, operator: portal }.abi_encode();
    TxRequest::call(token, data.into())
}

pub fn decode_erc1155_approved_for_all(ret: &[u8]) -> Result<bool> {
    IERC1155::isApprovedForAllCall::abi_decode_returns(ret, true)
        .map(|r| r._0)
        .map_err(|e| RollupsError::Abi(format!("isApprovedForAll: {}", e)))
}

// --- Plans ---

/// `InputBox.addInput(app, payload)`.
pub fn plan_add_input(contracts: &RollupsContracts, app: Address, payload: Bytes) -> TxRequest {
    let data = IInputBox::addInputCall { appContract: app, payload }.abi_encode();
    TxRequest::call(contracts.input_box, data.into())
}

pub fn plan_ether_deposit(
    contracts: &RollupsContracts,
    app: Address,
    amount: U256,
    exec_data: Option<Bytes>,
) -> DepositPlan {
    let exec_data = exec_data.unwrap_or_else(|| ether_deposit_message(amount));
    let data = IEtherPortal::depositEtherCall { appContract: app, execLayerData: exec_data }.abi_encode();
    DepositPlan {
        approval: None,
        deposit: TxRequest::call(contracts.ether_portal, data.into()).with_value(amount),
    }
}

/// Approves exactly `amount` when `current_allowance` is below it.
pub fn plan_erc20_deposit(
    contracts: &RollupsContracts,
    app: Address,
    token: Address,
    amount: U256,
    current_allowance: U256,
    exec_data: Option<Bytes>,
) -> DepositPlan {
    let portal = contracts.erc20_portal;
    let approval = (amount > current_allowance).then(|| {
        let data = IERC20::approveCall { spender: portal, amount }.abi_encode();
        TxRequest::call(token, data.into())
    });

    let exec_data = exec_data.unwrap_or_else(|| erc20_deposit_message(token, amount));
    let data = IERC20Portal::depositERC20TokensCall {
        token,
        appContract: app,
        value: amount,
        execLayerData: exec_data,
    }
    .abi_encode();

    DepositPlan { approval, deposit: TxRequest::call(portal, data.into()) }
}

pub fn plan_erc721_deposit(
    contracts: &RollupsContracts,
    app: Address,
    token: Address,
    id: U256,
    current_approved: Address,
    exec_data: Option<Bytes>,
) -> DepositPlan {
    let portal = contracts.erc721_portal;
    let approval = (current_approved != portal).then(|| {
        let data = IERC721::approveCall { to: portal, tokenId: id }.abi_encode();
        TxRequest::call(token, data.into())
    });

    let exec_data = exec_data.unwrap_or_else(|| erc721_deposit_message(token, id));
    let data = IERC721Portal::depositERC721TokenCall {
        token,
        appContract: app,
        tokenId: id,
        baseLayerData: Bytes::new(),
        execLayerData: exec_data,
    }
    .abi_encode();

    DepositPlan { approval, deposit: TxRequest::call(portal, data.into()) }
}

fn approval_for_all(token: Address, portal: Address, approved: bool) -> Option<TxRequest> {
    (!approved).then(|| {
        let data = IERC1155::setApprovalForAllCall { operator: portal, approved: true }.abi_encode();
        TxRequest::call(token, data.into())
    })
}

pub fn plan_erc1155_single_deposit(
    contracts: &RollupsContracts,
    app: Address,
    token: Address,
    id: U256,
    amount: U256,
    approved_for_all: bool,
    exec_data: Option<Bytes>,
) -> DepositPlan {
    let portal = contracts.erc1155_single_portal;
    let exec_data = exec_data.unwrap_or_else(|| erc1155_single_deposit_message(token, id, amount));
    let data = IERC1155SinglePortal::depositSingleERC1155TokenCall {
        token,
        appContract: app,
        tokenId: id,
        value: amount,
        baseLayerData: Bytes::new(),
        execLayerData: exec_data,
    }
    .abi_encode();

    DepositPlan {
        approval: approval_for_all(token, portal, approved_for_all),
        deposit: TxRequest::call(portal, data.into()),
    }
}

/// Fails on an empty batch.
pub fn plan_erc1155_batch_deposit(
    contracts: &RollupsContracts,
    app: Address,
    token: Address,
    batch: &Erc1155Batch,
    approved_for_all: bool,
    exec_data: Option<Bytes>,
) -> Result<DepositPlan> {
    if batch.is_empty() {
        return Err(RollupsError::Other("erc1155 batch has no entries".into()));
    }
    let portal = contracts.erc1155_batch_portal;
    let exec_data = exec_data.unwrap_or_else(|| erc1155_batch_deposit_message(token, batch));
    let data = IERC1155BatchPortal::depositBatchERC1155TokenCall {
        token,
        appContract: app,
        tokenIds: batch.ids().to_vec(),
        values: batch.amounts().to_vec(),
        baseLayerData: Bytes::new(),
        execLayerData: exec_data,
    }
    .abi_encode();

    Ok(DepositPlan {
        approval: approval_for_all(token, portal, approved_for_all),
        deposit: TxRequest::call(portal, data.into()),
    })
}

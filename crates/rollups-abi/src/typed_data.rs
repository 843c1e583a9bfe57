//! EIP-712 message accepted by the off-chain relay.
//!
//! The wallet signs the JSON envelope (`eth_signTypedData_v4`); the relay
//! receives the same envelope with the account and signature attached.

use std::borrow::Cow;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, Eip712Domain, SolStruct};
use serde::Serialize;

pub const DOMAIN_NAME: &str = "Cartesi";
pub const DOMAIN_VERSION: &str = "0.1.0";
pub const PRIMARY_TYPE: &str = "CartesiMessage";

sol! {
    #[allow(missing_docs)]
    struct CartesiMessage {
        address app;
        uint64 nonce;
        uint128 max_gas_price;
        bytes data;
    }
}

pub fn cartesi_domain(chain_id: u64) -> Eip712Domain {
    Eip712Domain::new(
        Some(Cow::Borrowed(DOMAIN_NAME)),
        Some(Cow::Borrowed(DOMAIN_VERSION)),
        Some(U256::from(chain_id)),
        Some(Address::ZERO),
        None,
    )
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypedField {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub ty: &'static str,
}

const fn field(name: &'static str, ty: &'static str) -> TypedField {
    TypedField { name, ty }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainJson {
    pub name: &'static str,
    pub version: &'static str,
    pub chain_id: u64,
    pub verifying_contract: Address,
}

#[derive(Debug, Clone, Serialize)]
pub struct TypesJson {
    #[serde(rename = "EIP712Domain")]
    pub eip712_domain: Vec<TypedField>,
    #[serde(rename = "CartesiMessage")]
    pub cartesi_message: Vec<TypedField>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageJson {
    pub app: Address,
    pub nonce: u64,
    pub data: Bytes,
    pub max_gas_price: u128,
}

/// `{domain, types, primaryType, message}` as wallets and the relay expect it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedDataEnvelope {
    pub domain: DomainJson,
    pub types: TypesJson,
    pub primary_type: &'static str,
    pub message: MessageJson,
}

/// A relay input ready to be signed.
#[derive(Debug, Clone)]
pub struct RelayTypedData {
    pub chain_id: u64,
    pub app: Address,
    pub nonce: u64,
    pub max_gas_price: u128,
    pub data: Bytes,
}

impl RelayTypedData {
    pub fn new(chain_id: u64, app: Address, nonce: u64, max_gas_price: u128, data: Bytes) -> Self {
        Self { chain_id, app, nonce, max_gas_price, data }
    }

    fn message(&self) -> CartesiMessage {
        CartesiMessage {
            app: self.app,
            nonce: self.nonce,
            max_gas_price: self.max_gas_price,
            data: self.data.clone(),
        }
    }

    /// The digest a wallet signs for this message.
    pub fn signing_hash(&self) -> B256 {
        self.message().eip712_signing_hash(&cartesi_domain(self.chain_id))
    }

    pub fn envelope(&self) -> TypedDataEnvelope {
        TypedDataEnvelope {
            domain: DomainJson {
                name: DOMAIN_NAME,
                version: DOMAIN_VERSION,
                chain_id: self.chain_id,
                verifying_contract: Address::ZERO,
            },
            types: TypesJson {
                eip712_domain: vec![
                    field("name", "string"),
                    field("version", "string"),
                    field("chainId", "uint256"),
                    field("verifyingContract", "address"),
                ],
                cartesi_message: vec![
                    field("app", "address"),
                    field("nonce", "uint64"),
                    field("max_gas_price", "uint128"),
                    field("data", "bytes"),
                ],
            },
            primary_type: PRIMARY_TYPE,
            message: MessageJson {
                app: self.app,
                nonce: self.nonce,
                data: self.data.clone(),
                max_gas_price: self.max_gas_price,
            },
        }
    }
}

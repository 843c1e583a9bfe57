//! Best-effort descriptions of voucher payloads.
//!
//! A voucher payload is an `Outputs` call whose inner `payload` is itself a
//! call to a token contract. The inner call is dispatched on its 4-byte
//! selector against a fixed table; anything unrecognised (or malformed) is
//! rendered as raw hex. Decoding never fails.

use std::fmt;

use alloy_primitives::{utils::format_units, Address, Bytes, U256};
use alloy_sol_types::{SolCall, SolInterface};
use rollups_types::bytes_to_hex;

use crate::bindings::{IERC1155, IERC20, IERC721Mint, IERC721UriMint, IERC721, Outputs};

/// Decoded view of a voucher payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetTransfer {
    Empty,
    Erc20Transfer { receiver: Address, amount: U256 },
    Erc721Transfer { receiver: Address, id: U256 },
    Erc1155SingleTransfer { receiver: Address, id: U256, amount: U256 },
    Erc1155BatchTransfer { receiver: Address, ids: Vec<U256>, amounts: Vec<U256> },
    Erc721MintWithUri { receiver: Address, uri: String },
    Erc721Mint { receiver: Address },
    /// Unrecognised call data, shown as hex.
    Raw(Bytes),
}

fn join(values: &[U256]) -> String {
    values.iter().map(U256::to_string).collect::<Vec<_>>().join(",")
}

impl fmt::Display for AssetTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("(empty)"),
            Self::Erc20Transfer { receiver, amount } => {
                write!(f, "Erc20 Transfer - Amount: {} - Address: {}", amount, receiver)
            }
            Self::Erc721Transfer { receiver, id } => {
                write!(f, "Erc721 Transfer - Id: {} - Address: {}", id, receiver)
            }
            Self::Erc1155SingleTransfer { receiver, id, amount } => write!(
                f,
                "Erc1155 Single Transfer - Id: {} Amount: {} - Address: {}",
                id, amount, receiver
            ),
            Self::Erc1155BatchTransfer { receiver, ids, amounts } => write!(
                f,
                "Erc1155 Batch Transfer - Ids: {} Amounts: {} - Address: {}",
                join(ids),
                join(amounts),
                receiver
            ),
            Self::Erc721MintWithUri { receiver, uri } => {
                write!(f, "Mint Erc721 - String: {} - Address: {}", uri, receiver)
            }
            Self::Erc721Mint { receiver } => write!(f, "Mint Erc721 - Address: {}", receiver),
            Self::Raw(bytes) => write!(f, "{} (hex)", bytes_to_hex(bytes)),
        }
    }
}

/// Inner-call selectors with a known decode schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownSelector {
    /// `transfer(address,uint256)`
    Erc20Transfer,
    /// `safeTransferFrom(address,address,uint256)`
    Erc721SafeTransfer,
    /// `safeTransferFrom(address,address,uint256,uint256,bytes)`
    Erc1155SafeTransfer,
    /// `safeBatchTransferFrom(address,address,uint256[],uint256[],bytes)`
    Erc1155SafeBatchTransfer,
    /// `mint(address,string)`
    Erc721MintWithUri,
    /// `mintTo(address)`
    Erc721MintTo,
    /// `mint(address)`
    Erc721Mint,
}

impl KnownSelector {
    pub const ALL: [Self; 7] = [
        Self::Erc20Transfer,
        Self::Erc721SafeTransfer,
        Self::Erc1155SafeTransfer,
        Self::Erc1155SafeBatchTransfer,
        Self::Erc721MintWithUri,
        Self::Erc721MintTo,
        Self::Erc721Mint,
    ];

    pub fn selector(self) -> [u8; 4] {
        match self {
            Self::Erc20Transfer => IERC20::transferCall::SELECTOR,
            Self::Erc721SafeTransfer => IERC721::safeTransferFromCall::SELECTOR,
            Self::Erc1155SafeTransfer => IERC1155::safeTransferFromCall::SELECTOR,
            Self::Erc1155SafeBatchTransfer => IERC1155::safeBatchTransferFromCall::SELECTOR,
            Self::Erc721MintWithUri => IERC721UriMint::mintCall::SELECTOR,
            Self::Erc721MintTo => IERC721Mint::mintToCall::SELECTOR,
            Self::Erc721Mint => IERC721Mint::mintCall::SELECTOR,
        }
    }

    pub fn from_selector(selector: &[u8]) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|known| known.selector().as_slice() == selector)
    }

    /// Decode a full inner call (selector included) with this schema.
    fn decode(self, call: &[u8]) -> Option<AssetTransfer> {
        let decoded = match self {
            Self::Erc20Transfer => IERC20::transferCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc20Transfer { receiver: c.to, amount: c.amount }),
            Self::Erc721SafeTransfer => IERC721::safeTransferFromCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc721Transfer { receiver: c.to, id: c.tokenId }),
            Self::Erc1155SafeTransfer => IERC1155::safeTransferFromCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc1155SingleTransfer {
                    receiver: c.to,
                    id: c.id,
                    amount: c.value,
                }),
            Self::Erc1155SafeBatchTransfer => {
                IERC1155::safeBatchTransferFromCall::abi_decode(call, false).map(|c| {
                    AssetTransfer::Erc1155BatchTransfer {
                        receiver: c.to,
                        ids: c.ids,
                        amounts: c.values,
                    }
                })
            }
            Self::Erc721MintWithUri => IERC721UriMint::mintCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc721MintWithUri { receiver: c.to, uri: c.uri }),
            Self::Erc721MintTo => IERC721Mint::mintToCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc721Mint { receiver: c.to }),
            Self::Erc721Mint => IERC721Mint::mintCall::abi_decode(call, false)
                .map(|c| AssetTransfer::Erc721Mint { receiver: c.to }),
        };
        decoded.ok()
    }
}

/// Describe the token call carried inside a voucher.
fn decode_inner(call: &Bytes) -> AssetTransfer {
    if call.len() <= 4 {
        return AssetTransfer::Raw(call.clone());
    }
    KnownSelector::from_selector(&call[..4])
        .and_then(|known| known.decode(call))
        .unwrap_or_else(|| AssetTransfer::Raw(call.clone()))
}

/// Decode a voucher payload into a transfer description.
///
/// Pure and total: empty input yields [`AssetTransfer::Empty`], anything that
/// does not decode yields [`AssetTransfer::Raw`].
pub fn decode_voucher_payload(payload: &[u8]) -> AssetTransfer {
    if payload.is_empty() {
        return AssetTransfer::Empty;
    }
    match Outputs::OutputsCalls::abi_decode(payload, false) {
        Ok(Outputs::OutputsCalls::Voucher(voucher)) => decode_inner(&voucher.payload),
        Ok(Outputs::OutputsCalls::DelegateCallVoucher(voucher)) => decode_inner(&voucher.payload),
        Ok(Outputs::OutputsCalls::Notice(notice)) => AssetTransfer::Raw(notice.payload),
        Err(_) => AssetTransfer::Raw(Bytes::copy_from_slice(payload)),
    }
}

/// Render an input payload the way the voucher table shows it.
pub fn describe_input_payload(payload: &[u8]) -> String {
    if payload.is_empty() {
        "(empty)".to_string()
    } else {
        format!("{} (hex)", bytes_to_hex(payload))
    }
}

/// Format a wei amount as ether.
pub fn format_ether(value: U256) -> String {
    format_units(value, 18u8).unwrap_or_else(|_| format!("{} wei", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const RECEIVER: Address = address!("abcdabcdabcdabcdabcdabcdabcdabcdabcdabcd");
    const TOKEN: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

    fn wrap(inner: Vec<u8>) -> Vec<u8> {
        Outputs::VoucherCall {
            destination: TOKEN,
            value: U256::ZERO,
            payload: inner.into(),
        }
        .abi_encode()
    }

    #[test]
    fn test_selector_table_matches_documented_values() {
        let expected: [(KnownSelector, &str); 7] = [
            (KnownSelector::Erc20Transfer, "a9059cbb"),
            (KnownSelector::Erc721SafeTransfer, "42842e0e"),
            (KnownSelector::Erc1155SafeTransfer, "f242432a"),
            (KnownSelector::Erc1155SafeBatchTransfer, "2eb2c2d6"),
            (KnownSelector::Erc721MintWithUri, "d0def521"),
            (KnownSelector::Erc721MintTo, "755edd17"),
            (KnownSelector::Erc721Mint, "6a627842"),
        ];
        for (known, hex) in expected {
            assert_eq!(alloy_primitives::hex::encode(known.selector()), hex);
        }
    }

    #[test]
    fn test_empty_payload() {
        assert_eq!(decode_voucher_payload(&[]), AssetTransfer::Empty);
        assert_eq!(decode_voucher_payload(&[]).to_string(), "(empty)");
    }

    #[test]
    fn test_erc20_transfer() {
        let inner = IERC20::transferCall { to: RECEIVER, amount: U256::from(100u64) }.abi_encode();
        assert_eq!(&inner[..4], &[0xa9, 0x05, 0x9c, 0xbb]);

        let description = decode_voucher_payload(&wrap(inner)).to_string();
        assert_eq!(
            description,
            format!("Erc20 Transfer - Amount: 100 - Address: {}", RECEIVER)
        );
        assert!(description.to_lowercase().ends_with("0xabcdabcdabcdabcdabcdabcdabcdabcdabcdabcd"));
    }

    #[test]
    fn test_erc721_transfer() {
        let inner = IERC721::safeTransferFromCall {
            from: TOKEN,
            to: RECEIVER,
            tokenId: U256::from(7u64),
        }
        .abi_encode();
        assert_eq!(
            decode_voucher_payload(&wrap(inner)).to_string(),
            format!("Erc721 Transfer - Id: 7 - Address: {}", RECEIVER)
        );
    }

    #[test]
    fn test_erc1155_single_and_batch() {
        let single = IERC1155::safeTransferFromCall {
            from: TOKEN,
            to: RECEIVER,
            id: U256::from(1u64),
            value: U256::from(50u64),
            data: Bytes::new(),
        }
        .abi_encode();
        assert_eq!(
            decode_voucher_payload(&wrap(single)).to_string(),
            format!("Erc1155 Single Transfer - Id: 1 Amount: 50 - Address: {}", RECEIVER)
        );

        let batch = IERC1155::safeBatchTransferFromCall {
            from: TOKEN,
            to: RECEIVER,
            ids: vec![U256::from(1u64), U256::from(2u64)],
            values: vec![U256::from(10u64), U256::from(20u64)],
            data: Bytes::new(),
        }
        .abi_encode();
        assert_eq!(
            decode_voucher_payload(&wrap(batch)),
            AssetTransfer::Erc1155BatchTransfer {
                receiver: RECEIVER,
                ids: vec![U256::from(1u64), U256::from(2u64)],
                amounts: vec![U256::from(10u64), U256::from(20u64)],
            }
        );
        assert!(decode_voucher_payload(&wrap(
            IERC1155::safeBatchTransferFromCall {
                from: TOKEN,
                to: RECEIVER,
                ids: vec![U256::from(1u64), U256::from(2u64)],
                values: vec![U256::from(10u64), U256::from(20u64)],
                data: Bytes::new(),
            }
            .abi_encode()
        ))
        .to_string()
        .starts_with("Erc1155 Batch Transfer - Ids: 1,2 Amounts: 10,20 - Address: "));
    }

    #[test]
    fn test_mint_variants() {
        let with_uri = IERC721UriMint::mintCall { to: RECEIVER, uri: "http://test.com".into() }
            .abi_encode();
        assert_eq!(
            decode_voucher_payload(&wrap(with_uri)).to_string(),
            format!("Mint Erc721 - String: http://test.com - Address: {}", RECEIVER)
        );

        let mint_to = IERC721Mint::mintToCall { to: RECEIVER }.abi_encode();
        let mint = IERC721Mint::mintCall { to: RECEIVER }.abi_encode();
        for inner in [mint_to, mint] {
            assert_eq!(
                decode_voucher_payload(&wrap(inner)),
                AssetTransfer::Erc721Mint { receiver: RECEIVER }
            );
        }
    }

    #[test]
    fn test_unknown_selector_falls_back_to_hex() {
        let inner = vec![0xde, 0xad, 0xbe, 0xef, 0x01, 0x02];
        assert_eq!(
            decode_voucher_payload(&wrap(inner)).to_string(),
            "0xdeadbeef0102 (hex)"
        );
    }

    #[test]
    fn test_short_or_truncated_inner_falls_back_to_hex() {
        assert_eq!(
            decode_voucher_payload(&wrap(vec![0xa9, 0x05, 0x9c, 0xbb])).to_string(),
            "0xa9059cbb (hex)"
        );
        // known selector, missing arguments
        let truncated = vec![0xa9, 0x05, 0x9c, 0xbb, 0x00, 0x01];
        assert_eq!(
            decode_voucher_payload(&wrap(truncated.clone())),
            AssetTransfer::Raw(truncated.into())
        );
    }

    #[test]
    fn test_undecodable_outer_payload() {
        assert_eq!(decode_voucher_payload(&[1, 2, 3]).to_string(), "0x010203 (hex)");
    }

    #[test]
    fn test_delegate_call_voucher_and_notice() {
        let inner = IERC721Mint::mintCall { to: RECEIVER }.abi_encode();
        let delegate = Outputs::DelegateCallVoucherCall {
            destination: TOKEN,
            payload: inner.into(),
        }
        .abi_encode();
        assert_eq!(
            decode_voucher_payload(&delegate),
            AssetTransfer::Erc721Mint { receiver: RECEIVER }
        );

        let notice = Outputs::NoticeCall { payload: Bytes::from_static(b"hi") }.abi_encode();
        assert_eq!(decode_voucher_payload(&notice).to_string(), "0x6869 (hex)");
    }

    #[test]
    fn test_describe_input_payload_and_ether() {
        assert_eq!(describe_input_payload(&[]), "(empty)");
        assert_eq!(describe_input_payload(b"ok"), "0x6f6b (hex)");
        assert!(format_ether(U256::from(1_500_000_000_000_000_000u128)).starts_with("1.5"));
    }
}

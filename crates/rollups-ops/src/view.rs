//! Voucher table rows.

use alloy_primitives::{Address, U256};
use rollups_abi::{decode_voucher_payload, describe_input_payload, format_ether};
use rollups_types::VoucherSummary;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoucherView {
    pub index: u64,
    pub input_id: Option<String>,
    pub input_payload_description: String,
    pub destination: Address,
    pub value: U256,
    pub value_ether: String,
    pub description: String,
}

impl From<&VoucherSummary> for VoucherView {
    fn from(summary: &VoucherSummary) -> Self {
        let input_payload = summary.input.as_ref().map(|i| i.payload.as_ref()).unwrap_or_default();
        Self {
            index: summary.index,
            input_id: summary.input.as_ref().map(|i| i.id.clone()),
            input_payload_description: describe_input_payload(input_payload),
            destination: summary.destination,
            value: summary.value,
            value_ether: format_ether(summary.value),
            description: decode_voucher_payload(&summary.payload).to_string(),
        }
    }
}

pub fn views(summaries: &[VoucherSummary]) -> Vec<VoucherView> {
    summaries.iter().map(VoucherView::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Bytes};
    use alloy_sol_types::SolCall;
    use rollups_abi::bindings::{Outputs, IERC20};
    use rollups_types::InputRef;

    #[test]
    fn test_view_of_erc20_voucher() {
        let receiver = address!("abcdabcdabcdabcdabcdabcdabcdabcdabcdabcd");
        let inner = IERC20::transferCall { to: receiver, amount: U256::from(100u64) }.abi_encode();
        let payload = Outputs::VoucherCall {
            destination: Address::repeat_byte(0x0d),
            value: U256::ZERO,
            payload: inner.into(),
        }
        .abi_encode();

        let summary = VoucherSummary {
            index: 4,
            destination: Address::repeat_byte(0x0d),
            value: U256::ZERO,
            payload: payload.into(),
            input: Some(InputRef {
                id: "2".into(),
                index: Some(2),
                payload: Bytes::from_static(&[0x12, 0x34]),
            }),
        };

        let view = VoucherView::from(&summary);
        assert_eq!(view.index, 4);
        assert_eq!(view.input_id.as_deref(), Some("2"));
        assert_eq!(view.input_payload_description, "0x1234 (hex)");
        assert!(view.value_ether.starts_with('0'));
        assert!(view.description.starts_with("Erc20 Transfer - Amount: 100 - Address: "));
        assert!(view
            .description
            .to_lowercase()
            .ends_with("0xabcdabcdabcdabcdabcdabcdabcdabcdabcdabcd"));
    }

    #[test]
    fn test_view_without_input_or_payload() {
        let summary = VoucherSummary {
            index: 0,
            destination: Address::ZERO,
            value: U256::ZERO,
            payload: Bytes::new(),
            input: None,
        };
        let view = VoucherView::from(&summary);
        assert_eq!(view.input_id, None);
        assert_eq!(view.input_payload_description, "(empty)");
        assert_eq!(view.description, "(empty)");
    }
}

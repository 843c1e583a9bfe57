//! Calldata for the application's output entry points and revert decoding.

use alloy_primitives::{Bytes, U256};
use alloy_sol_types::{SolCall, SolError};
use rollups_types::{OutputProof, Result, RollupsError};

use crate::bindings::{IApplication, OutputValidityProof};

/// `validateOutput(output, proof)` calldata.
pub fn validate_output_calldata(output: &Bytes, proof: &OutputProof) -> Bytes {
    IApplication::validateOutputCall {
        output: output.clone(),
        proof: OutputValidityProof::from(proof),
    }
    .abi_encode()
    .into()
}

/// `executeOutput(output, proof)` calldata; same argument shape as validation.
pub fn execute_output_calldata(output: &Bytes, proof: &OutputProof) -> Bytes {
    IApplication::executeOutputCall {
        output: output.clone(),
        proof: OutputValidityProof::from(proof),
    }
    .abi_encode()
    .into()
}

pub fn was_output_executed_calldata(output_index: u64) -> Bytes {
    IApplication::wasOutputExecutedCall {
        outputIndex: U256::from(output_index),
    }
    .abi_encode()
    .into()
}

pub fn decode_was_output_executed(ret: &[u8]) -> Result<bool> {
    IApplication::wasOutputExecutedCall::abi_decode_returns(ret, true)
        .map(|r| r._0)
        .map_err(|e| RollupsError::Abi(format!("wasOutputExecuted returned garbage: {}", e)))
}

fn error_entry<E: SolError>() -> ([u8; 4], &'static str) {
    let name = E::SIGNATURE.split('(').next().unwrap_or(E::SIGNATURE);
    (E::SELECTOR, name)
}

fn application_errors() -> [([u8; 4], &'static str); 5] {
    [
        error_entry::<IApplication::OutputNotExecutable>(),
        error_entry::<IApplication::OutputNotReexecutable>(),
        error_entry::<IApplication::InsufficientFunds>(),
        error_entry::<IApplication::InvalidOutputHashesSiblingsArrayLength>(),
        error_entry::<IApplication::InvalidOutputsMerkleRoot>(),
    ]
}

/// Human-readable reason for revert data.
///
/// Application custom errors resolve to their name; `Error(string)` and
/// `Panic(uint256)` to their decoded message. Unknown data yields `None`.
pub fn revert_reason(data: &[u8]) -> Option<String> {
    if data.is_empty() {
        return None;
    }
    if let Some(selector) = data.get(..4) {
        if let Some((_, name)) = application_errors()
            .into_iter()
            .find(|(known, _)| known.as_slice() == selector)
        {
            return Some(name.to_string());
        }
    }
    alloy_sol_types::decode_revert_reason(data).filter(|reason| !reason.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use alloy_sol_types::Revert;

    fn proof() -> OutputProof {
        OutputProof {
            output_index: 4,
            output_hashes_siblings: vec![B256::repeat_byte(0xaa), B256::repeat_byte(0xbb)],
        }
    }

    #[test]
    fn test_validate_and_execute_share_argument_shape() {
        let output = Bytes::from_static(&[1, 2, 3]);
        let validate = validate_output_calldata(&output, &proof());
        let execute = execute_output_calldata(&output, &proof());

        assert_eq!(&validate[..4], IApplication::validateOutputCall::SELECTOR.as_slice());
        assert_eq!(&execute[..4], IApplication::executeOutputCall::SELECTOR.as_slice());
        assert_eq!(validate[4..], execute[4..]);

        let decoded = IApplication::validateOutputCall::abi_decode(&validate, true).unwrap();
        assert_eq!(decoded.output, output);
        assert_eq!(decoded.proof.outputIndex, 4);
        assert_eq!(decoded.proof.outputHashesSiblings, proof().output_hashes_siblings);
    }

    #[test]
    fn test_was_output_executed_roundtrip_returns() {
        let calldata = was_output_executed_calldata(9);
        let call = IApplication::wasOutputExecutedCall::abi_decode(&calldata, true).unwrap();
        assert_eq!(call.outputIndex, U256::from(9u64));

        let mut ret = [0u8; 32];
        ret[31] = 1;
        assert!(decode_was_output_executed(&ret).unwrap());
        assert!(!decode_was_output_executed(&[0u8; 32]).unwrap());
        assert!(decode_was_output_executed(&[1, 2]).is_err());
    }

    #[test]
    fn test_revert_reason_custom_error_name() {
        let data = IApplication::InvalidOutputsMerkleRoot {
            outputsMerkleRoot: B256::repeat_byte(7),
        }
        .abi_encode();
        assert_eq!(revert_reason(&data).as_deref(), Some("InvalidOutputsMerkleRoot"));

        let data = IApplication::InvalidOutputHashesSiblingsArrayLength {}.abi_encode();
        assert_eq!(
            revert_reason(&data).as_deref(),
            Some("InvalidOutputHashesSiblingsArrayLength")
        );
    }

    #[test]
    fn test_revert_reason_standard_error() {
        let data = Revert { reason: "not allowed".into() }.abi_encode();
        assert!(revert_reason(&data).unwrap().contains("not allowed"));
        assert_eq!(revert_reason(&[]), None);
    }
}

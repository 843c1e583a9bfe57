//! Proof validation against the application's `validateOutput`.

use alloy_primitives::Address;
use rollups_abi::application::validate_output_calldata;
use rollups_chain::ChainReader;
use rollups_types::{RollupsError, VoucherDetail};
use tracing::*;

use crate::ValidationVerdict;

/// Check a voucher's proof with a read-only call.
///
/// No call is made when the voucher has no payload or no proof. A revert is
/// `Invalid` with the decoded reason; any other call failure is `Invalid`
/// with the transport's short message.
pub async fn validate_voucher(
    reader: &dyn ChainReader,
    app: Address,
    voucher: &VoucherDetail,
) -> ValidationVerdict {
    let (payload, proof) = match voucher.provable_parts() {
        Ok(parts) => parts,
        Err(what) => return ValidationVerdict::Unavailable(what),
    };

    let data = validate_output_calldata(payload, proof);
    match reader.call(app, data).await {
        Ok(_) => {
            debug!(chain_id = reader.chain_id(), index = voucher.index(), "voucher proof is valid");
            ValidationVerdict::Valid
        }
        Err(e @ RollupsError::Reverted { .. }) => {
            debug!(chain_id = reader.chain_id(), index = voucher.index(), error = %e, "voucher proof rejected");
            ValidationVerdict::Invalid(e.short_message())
        }
        Err(e) => {
            warn!(chain_id = reader.chain_id(), index = voucher.index(), error = %e, "validateOutput call failed");
            ValidationVerdict::Invalid(e.short_message())
        }
    }
}

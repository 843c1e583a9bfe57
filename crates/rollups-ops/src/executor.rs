//! Voucher execution through the connected wallet.
//!
//! `executeOutput` is sent with the same payload/proof shape as validation,
//! then confirmed on-chain. The application's execution bit is the guard
//! against double execution; nothing here re-checks it.

use alloy_primitives::{Address, B256};
use rollups_abi::application::execute_output_calldata;
use rollups_chain::{ChainReader, WalletClient};
use rollups_types::{Result, RollupsError, TxReceipt, TxRequest, VoucherDetail};
use tracing::*;

use crate::ExecutionOutcome;

pub struct VoucherExecutor<'a> {
    reader: &'a dyn ChainReader,
    wallet: &'a dyn WalletClient,
    confirmations: u64,
}

impl<'a> VoucherExecutor<'a> {
    /// `confirmations` below one is raised to one.
    pub fn new(reader: &'a dyn ChainReader, wallet: &'a dyn WalletClient, confirmations: u64) -> Self {
        Self { reader, wallet, confirmations: confirmations.max(1) }
    }

    /// Sign and send `executeOutput`; returns the transaction hash.
    pub async fn submit(&self, app: Address, voucher: &VoucherDetail) -> Result<B256> {
        let (payload, proof) = voucher.provable_parts().map_err(RollupsError::Unavailable)?;
        let data = execute_output_calldata(payload, proof);
        let tx_hash = self.wallet.send_transaction(TxRequest::call(app, data)).await?;
        info!(chain_id = self.reader.chain_id(), index = voucher.index(), %tx_hash, "voucher execution submitted");
        Ok(tx_hash)
    }

    /// Wait for the configured confirmations.
    pub async fn confirm(&self, tx_hash: B256) -> Result<TxReceipt> {
        let receipt = self.reader.wait_for_receipt(tx_hash, self.confirmations).await?;
        if !receipt.success {
            return Err(RollupsError::Reverted {
                message: format!("transaction {} reverted", tx_hash),
                data: None,
            });
        }
        Ok(receipt)
    }

    /// Submit and confirm. `voucher.executed` is set only on confirmation.
    pub async fn execute(&self, app: Address, voucher: &mut VoucherDetail) -> ExecutionOutcome {
        if let Err(what) = voucher.provable_parts() {
            return ExecutionOutcome::Unavailable(what);
        }

        let tx_hash = match self.submit(app, voucher).await {
            Ok(hash) => hash,
            Err(e) => return failed(voucher.index(), e, None),
        };

        match self.confirm(tx_hash).await {
            Ok(receipt) => {
                voucher.executed = true;
                ExecutionOutcome::Confirmed { tx_hash, block_number: receipt.block_number }
            }
            Err(e) => failed(voucher.index(), e, Some(tx_hash)),
        }
    }
}

pub(crate) fn failed(index: u64, e: RollupsError, tx_hash: Option<B256>) -> ExecutionOutcome {
    warn!(index, error = %e, "voucher execution failed");
    ExecutionOutcome::Failed { reason: e.short_message(), tx_hash }
}

/// One-shot [`VoucherExecutor::execute`].
pub async fn execute_voucher(
    reader: &dyn ChainReader,
    wallet: &dyn WalletClient,
    app: Address,
    voucher: &mut VoucherDetail,
    confirmations: u64,
) -> ExecutionOutcome {
    VoucherExecutor::new(reader, wallet, confirmations).execute(app, voucher).await
}

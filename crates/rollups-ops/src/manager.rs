//! Voucher lifecycle manager.
//!
//! Drives load → select → validate → execute for one application at a time,
//! keeping the local list, the selected voucher and its execution state in a
//! [`VoucherStore`]. Chain id and wallet are passed into every call.
//!
//! Every failure is returned to the caller and also reported through
//! [`VoucherEvent::Failed`]. Nothing is retried automatically.

use std::sync::Arc;

use alloy_primitives::Address;
use rollups_abi::application::{decode_was_output_executed, was_output_executed_calldata};
use rollups_chain::{ChainReader, ReaderFactory, RpcReaderPool, WalletClient};
use rollups_indexer::{
    sort_for_display, GraphqlRepositoryFactory, IndexerConfig, RepositoryFactory, VoucherRepository,
};
use rollups_store::{AppKey, ExecutionState, OperationKind, OperationStatus, VoucherStore};
use rollups_types::{ChainRegistry, ClientConfig, Result, Unavailability, VoucherDetail};
use serde_json::json;
use tracing::*;

use crate::executor::{failed, VoucherExecutor};
use crate::validator::validate_voucher;
use crate::view::{views, VoucherView};
use crate::{new_operation, ExecutionOutcome, ValidationVerdict, VoucherEvent, VoucherEventHandler};

pub struct VoucherManager {
    registry: ChainRegistry,
    repositories: Arc<dyn RepositoryFactory>,
    readers: Arc<dyn ReaderFactory>,
    store: Arc<dyn VoucherStore>,
    config: ClientConfig,
    on_event: Option<VoucherEventHandler>,
}

impl VoucherManager {
    pub fn new(
        registry: ChainRegistry,
        repositories: Arc<dyn RepositoryFactory>,
        readers: Arc<dyn ReaderFactory>,
        store: Arc<dyn VoucherStore>,
        config: ClientConfig,
        on_event: Option<VoucherEventHandler>,
    ) -> Self {
        Self { registry, repositories, readers, store, config, on_event }
    }

    /// GraphQL indexer and JSON-RPC readers.
    pub fn with_rpc(
        registry: ChainRegistry,
        store: Arc<dyn VoucherStore>,
        config: ClientConfig,
        on_event: Option<VoucherEventHandler>,
    ) -> Self {
        let indexer = IndexerConfig {
            request_timeout_ms: config.request_timeout_ms,
            ..IndexerConfig::default()
        };
        Self::new(
            registry,
            Arc::new(GraphqlRepositoryFactory::new(indexer)),
            Arc::new(RpcReaderPool::new(config.clone())),
            store,
            config,
            on_event,
        )
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn VoucherStore> {
        &self.store
    }

    fn emit(&self, event: VoucherEvent) {
        if let Some(ref handler) = self.on_event {
            handler(event);
        }
    }

    fn report<T>(&self, chain_id: u64, result: Result<T>) -> Result<T> {
        if let Err(ref e) = result {
            warn!(chain_id, error = %e, "voucher operation failed");
            self.emit(VoucherEvent::Failed { chain_id, message: e.to_string() });
        }
        result
    }

    fn repository(&self, chain_id: u64, app: Address) -> Result<Arc<dyn VoucherRepository>> {
        let endpoint = self.registry.resolve_indexer(chain_id, &app)?;
        debug!(chain_id, %endpoint, "indexer endpoint");
        Ok(self.repositories.repository(&endpoint))
    }

    fn reader(&self, chain_id: u64) -> Result<Arc<dyn ChainReader>> {
        let chain = self.registry.resolve(chain_id)?;
        Ok(self.readers.reader(chain))
    }

    /// Fetch all vouchers of `app`, newest first.
    ///
    /// The stored list is replaced only when the whole load succeeds.
    pub async fn load_vouchers(&self, chain_id: u64, app: Address) -> Result<Vec<VoucherView>> {
        let result = self.try_load_vouchers(chain_id, app).await;
        self.report(chain_id, result)
    }

    async fn try_load_vouchers(&self, chain_id: u64, app: Address) -> Result<Vec<VoucherView>> {
        let repository = self.repository(chain_id, app)?;
        let mut vouchers = repository.list_vouchers().await?;
        sort_for_display(&mut vouchers);

        let rows = views(&vouchers);
        let count = vouchers.len();
        self.store.replace_vouchers(AppKey::new(chain_id, app), vouchers).await?;

        info!(chain_id, %app, count, "vouchers loaded");
        self.emit(VoucherEvent::Loaded { chain_id, app, count });
        Ok(rows)
    }

    /// The last successfully loaded list.
    pub async fn vouchers(&self, chain_id: u64, app: Address) -> Result<Vec<VoucherView>> {
        let stored = self.store.list_vouchers(AppKey::new(chain_id, app)).await?;
        Ok(views(&stored))
    }

    /// Fetch one voucher and select it.
    ///
    /// `executed` is read from the application, not from the indexer. When
    /// either read fails the previous selection is kept.
    pub async fn load_voucher(
        &self,
        chain_id: u64,
        app: Address,
        index: u64,
    ) -> Result<Option<VoucherDetail>> {
        let result = self.try_load_voucher(chain_id, app, index).await;
        self.report(chain_id, result)
    }

    async fn try_load_voucher(
        &self,
        chain_id: u64,
        app: Address,
        index: u64,
    ) -> Result<Option<VoucherDetail>> {
        let repository = self.repository(chain_id, app)?;
        let Some(mut voucher) = repository.get_voucher(index).await? else {
            debug!(chain_id, index, "voucher not found");
            return Ok(None);
        };

        let reader = self.reader(chain_id)?;
        let ret = reader.call(app, was_output_executed_calldata(voucher.index())).await?;
        voucher.executed = decode_was_output_executed(&ret)?;

        let key = AppKey::new(chain_id, app);
        self.store
            .transition_execution_state(
                key,
                index,
                ExecutionState::accepts_execution,
                ExecutionState::Selected,
            )
            .await?;
        self.store.set_selected(key, voucher.clone()).await?;

        self.emit(VoucherEvent::Selected { chain_id, index, executed: voucher.executed });
        Ok(Some(voucher))
    }

    pub async fn selected(&self, chain_id: u64, app: Address) -> Result<Option<VoucherDetail>> {
        self.store.selected(AppKey::new(chain_id, app)).await
    }

    pub async fn execution_state(
        &self,
        chain_id: u64,
        app: Address,
        index: u64,
    ) -> Result<Option<ExecutionState>> {
        self.store.execution_state(AppKey::new(chain_id, app), index).await
    }

    /// Validate the selected voucher's proof.
    pub async fn validate(&self, chain_id: u64, app: Address) -> Result<ValidationVerdict> {
        let result = self.try_validate(chain_id, app).await;
        self.report(chain_id, result)
    }

    async fn try_validate(&self, chain_id: u64, app: Address) -> Result<ValidationVerdict> {
        let key = AppKey::new(chain_id, app);
        let Some(voucher) = self.store.selected(key).await? else {
            return Ok(ValidationVerdict::Unavailable(Unavailability::MissingPayload));
        };
        if let Err(what) = voucher.provable_parts() {
            return Ok(ValidationVerdict::Unavailable(what));
        }

        let reader = self.reader(chain_id)?;
        let index = voucher.index();
        // An execute in flight or done keeps its state.
        let marked = self
            .store
            .transition_execution_state(
                key,
                index,
                ExecutionState::accepts_validation,
                ExecutionState::Validating,
            )
            .await?;

        let verdict = validate_voucher(reader.as_ref(), app, &voucher).await;

        if marked.applied {
            let restored = marked.previous.unwrap_or(ExecutionState::Selected);
            self.store
                .transition_execution_state(
                    key,
                    index,
                    |state| matches!(state, Some(ExecutionState::Validating)),
                    restored,
                )
                .await?;
        }
        let status = if verdict.is_valid() { OperationStatus::Succeeded } else { OperationStatus::Failed };
        let op = new_operation(
            key,
            OperationKind::ValidateVoucher,
            status,
            None,
            verdict.message(),
            json!({ "index": index }),
        );
        self.store.create_operation(&op).await?;

        self.emit(VoucherEvent::Validated { chain_id, index, verdict: verdict.clone() });
        Ok(verdict)
    }

    /// Execute the selected voucher with the connected wallet.
    ///
    /// Nothing is sent when the voucher is unprovable, already executed, or
    /// has another execute in flight. The local `executed` flag is set only
    /// after confirmation.
    pub async fn execute(
        &self,
        chain_id: u64,
        app: Address,
        wallet: &dyn WalletClient,
    ) -> Result<ExecutionOutcome> {
        let result = self.try_execute(chain_id, app, wallet).await;
        self.report(chain_id, result)
    }

    async fn try_execute(
        &self,
        chain_id: u64,
        app: Address,
        wallet: &dyn WalletClient,
    ) -> Result<ExecutionOutcome> {
        let key = AppKey::new(chain_id, app);
        let Some(voucher) = self.store.selected(key).await? else {
            return Ok(ExecutionOutcome::Unavailable(Unavailability::MissingPayload));
        };
        if voucher.executed {
            return Ok(ExecutionOutcome::AlreadyExecuted);
        }
        if let Err(what) = voucher.provable_parts() {
            return Ok(ExecutionOutcome::Unavailable(what));
        }

        let reader = self.reader(chain_id)?;
        let executor = VoucherExecutor::new(reader.as_ref(), wallet, self.config.confirmations);
        let index = voucher.index();

        let claim = self
            .store
            .transition_execution_state(
                key,
                index,
                ExecutionState::accepts_execution,
                ExecutionState::Executing,
            )
            .await?;
        if !claim.applied {
            debug!(chain_id, index, state = ?claim.previous, "execution not started");
            return Ok(match claim.previous {
                Some(ExecutionState::Confirmed { .. }) => ExecutionOutcome::AlreadyExecuted,
                Some(ExecutionState::Submitted { tx_hash }) => {
                    ExecutionOutcome::Pending { tx_hash: Some(tx_hash) }
                }
                _ => ExecutionOutcome::Pending { tx_hash: None },
            });
        }

        let tx_hash = match executor.submit(app, &voucher).await {
            Ok(hash) => hash,
            Err(e) => {
                let outcome = failed(index, e, None);
                self.finish_failed(key, index, &outcome).await?;
                return Ok(outcome);
            }
        };
        self.store
            .set_execution_state(key, index, ExecutionState::Submitted { tx_hash })
            .await?;
        self.emit(VoucherEvent::Submitted { chain_id, index, tx_hash });

        let outcome = match executor.confirm(tx_hash).await {
            Ok(receipt) => ExecutionOutcome::Confirmed { tx_hash, block_number: receipt.block_number },
            Err(e) => failed(index, e, Some(tx_hash)),
        };
        if !outcome.is_confirmed() {
            self.finish_failed(key, index, &outcome).await?;
            return Ok(outcome);
        }

        self.store.mark_executed(key, index).await?;
        self.store
            .set_execution_state(key, index, ExecutionState::Confirmed { tx_hash })
            .await?;
        let op = new_operation(
            key,
            OperationKind::ExecuteVoucher,
            OperationStatus::Succeeded,
            Some(tx_hash),
            outcome.message(),
            json!({ "index": index }),
        );
        self.store.create_operation(&op).await?;

        info!(chain_id, index, %tx_hash, "voucher executed");
        self.emit(VoucherEvent::Confirmed { chain_id, index, tx_hash });
        Ok(outcome)
    }

    async fn finish_failed(&self, key: AppKey, index: u64, outcome: &ExecutionOutcome) -> Result<()> {
        let (reason, tx_hash) = match outcome {
            ExecutionOutcome::Failed { reason, tx_hash } => (reason.clone(), *tx_hash),
            other => (other.message(), None),
        };
        self.store
            .set_execution_state(key, index, ExecutionState::Failed { reason: reason.clone() })
            .await?;
        let op = new_operation(
            key,
            OperationKind::ExecuteVoucher,
            OperationStatus::Failed,
            tx_hash,
            outcome.message(),
            json!({ "index": index }),
        );
        self.store.create_operation(&op).await?;
        self.emit(VoucherEvent::Failed { chain_id: key.chain_id, message: outcome.message() });
        Ok(())
    }
}

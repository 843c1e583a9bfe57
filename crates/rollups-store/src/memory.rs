//! In-memory voucher store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::*;
use rollups_types::Result;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory voucher store (for a single session and for testing).
pub struct MemoryStore {
    vouchers: Mutex<HashMap<AppKey, Vec<VoucherSummary>>>,
    selected: Mutex<HashMap<AppKey, VoucherDetail>>,
    states: Mutex<HashMap<(AppKey, u64), ExecutionState>>,
    operations: Mutex<Vec<StoredOperation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            vouchers: Mutex::new(HashMap::new()),
            selected: Mutex::new(HashMap::new()),
            states: Mutex::new(HashMap::new()),
            operations: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VoucherStore for MemoryStore {
    async fn replace_vouchers(&self, key: AppKey, vouchers: Vec<VoucherSummary>) -> Result<()> {
        lock(&self.vouchers).insert(key, vouchers);
        Ok(())
    }

    async fn list_vouchers(&self, key: AppKey) -> Result<Vec<VoucherSummary>> {
        Ok(lock(&self.vouchers).get(&key).cloned().unwrap_or_default())
    }

    async fn set_selected(&self, key: AppKey, voucher: VoucherDetail) -> Result<()> {
        lock(&self.selected).insert(key, voucher);
        Ok(())
    }

    async fn selected(&self, key: AppKey) -> Result<Option<VoucherDetail>> {
        Ok(lock(&self.selected).get(&key).cloned())
    }

    async fn mark_executed(&self, key: AppKey, index: u64) -> Result<bool> {
        let mut selected = lock(&self.selected);
        match selected.get_mut(&key) {
            Some(voucher) if voucher.index() == index && !voucher.executed => {
                voucher.executed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_execution_state(&self, key: AppKey, index: u64, state: ExecutionState) -> Result<()> {
        lock(&self.states).insert((key, index), state);
        Ok(())
    }

    async fn execution_state(&self, key: AppKey, index: u64) -> Result<Option<ExecutionState>> {
        Ok(lock(&self.states).get(&(key, index)).cloned())
    }

    async fn transition_execution_state(
        &self,
        key: AppKey,
        index: u64,
        accept: for<'s> fn(Option<&'s ExecutionState>) -> bool,
        next: ExecutionState,
    ) -> Result<Transition> {
        let mut states = lock(&self.states);
        let previous = states.get(&(key, index)).cloned();
        let applied = accept(previous.as_ref());
        if applied {
            states.insert((key, index), next);
        }
        Ok(Transition { previous, applied })
    }

    async fn create_operation(&self, op: &StoredOperation) -> Result<()> {
        lock(&self.operations).push(op.clone());
        Ok(())
    }

    async fn list_operations(&self, chain_id: Option<u64>) -> Result<Vec<StoredOperation>> {
        let ops = lock(&self.operations);
        let filtered = ops
            .iter()
            .filter(|o| chain_id.map_or(true, |cid| o.chain_id == cid))
            .cloned()
            .collect();
        Ok(filtered)
    }
}

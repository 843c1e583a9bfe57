//! Voucher repository backed by the rollups node indexer.
//!
//! - `list_vouchers`: all voucher summaries of one application, newest first
//! - `get_voucher`: one voucher with its inclusion proof, when settled

pub mod graphql;

use std::sync::Arc;

use async_trait::async_trait;
use rollups_types::{Result, VoucherDetail, VoucherSummary};

pub use graphql::GraphqlClient;

/// Read access to the vouchers of one application on one chain.
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Summaries sorted by descending index.
    async fn list_vouchers(&self) -> Result<Vec<VoucherSummary>>;

    /// `Ok(None)` when the indexer has no voucher at `index`.
    async fn get_voucher(&self, index: u64) -> Result<Option<VoucherDetail>>;
}

/// Creates a repository for a resolved indexer endpoint.
pub trait RepositoryFactory: Send + Sync {
    fn repository(&self, endpoint: &str) -> Arc<dyn VoucherRepository>;
}

/// Indexer configuration.
#[derive(Debug, Clone)]
pub struct IndexerConfig {
    pub page_size: u64,
    pub request_timeout_ms: u64,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            page_size: 100,
            request_timeout_ms: 20_000,
        }
    }
}

/// Builds a [`GraphqlClient`] per endpoint.
#[derive(Debug, Clone, Default)]
pub struct GraphqlRepositoryFactory {
    config: IndexerConfig,
}

impl GraphqlRepositoryFactory {
    pub fn new(config: IndexerConfig) -> Self {
        Self { config }
    }
}

impl RepositoryFactory for GraphqlRepositoryFactory {
    fn repository(&self, endpoint: &str) -> Arc<dyn VoucherRepository> {
        Arc::new(GraphqlClient::new(
            endpoint,
            Some(self.config.request_timeout_ms),
            Some(self.config.page_size),
        ))
    }
}

/// Display order: highest (most recent) index first.
pub fn sort_for_display(vouchers: &mut [VoucherSummary]) {
    vouchers.sort_by(|a, b| b.index.cmp(&a.index));
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256};

    fn summary(index: u64) -> VoucherSummary {
        VoucherSummary {
            index,
            destination: Address::ZERO,
            value: U256::ZERO,
            payload: Bytes::new(),
            input: None,
        }
    }

    #[test]
    fn test_sort_for_display_is_descending() {
        let mut vouchers = vec![summary(1), summary(5), summary(0), summary(3)];
        sort_for_display(&mut vouchers);
        let order: Vec<u64> = vouchers.iter().map(|v| v.index).collect();
        assert_eq!(order, vec![5, 3, 1, 0]);
    }

    #[test]
    fn test_factory_binds_endpoint() {
        let factory = GraphqlRepositoryFactory::default();
        let client = GraphqlClient::new("http://localhost:8080/graphql/0x01", None, None);
        assert_eq!(client.endpoint(), "http://localhost:8080/graphql/0x01");
        let _repo = factory.repository(client.endpoint());
    }
}

//! HTTP client for the rollups node GraphQL indexer.
//!
//! Queries:
//! - `vouchers(first, after)`: paged voucher summaries
//! - `voucher(outputIndex)`: one voucher with its proof

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use rollups_types::{
    hex_to_bytes, hex_to_u256, InputRef, OutputProof, Result, RollupsError, VoucherDetail,
    VoucherSummary,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::*;

use crate::{sort_for_display, VoucherRepository};

const VOUCHERS_QUERY: &str = r#"query vouchers($first: Int, $after: String) {
  vouchers(first: $first, after: $after) {
    pageInfo { hasNextPage endCursor }
    edges { node { index destination payload value input { id index payload } } }
  }
}"#;

const VOUCHER_QUERY: &str = r#"query voucher($outputIndex: Int!) {
  voucher(outputIndex: $outputIndex) {
    index destination payload value executed
    input { id index payload }
    proof { outputIndex outputHashesSiblings }
  }
}"#;

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: Value,
}

#[derive(Debug, Deserialize)]
pub struct GraphqlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Connection<T> {
    #[serde(default)]
    page_info: PageInfo,
    edges: Vec<Edge<T>>,
}

#[derive(Debug, Deserialize)]
struct Edge<T> {
    node: T,
}

#[derive(Debug, Deserialize)]
struct VouchersData {
    vouchers: Connection<WireVoucher>,
}

#[derive(Debug, Deserialize)]
struct VoucherData {
    voucher: Option<WireVoucher>,
}

#[derive(Debug, Deserialize)]
struct WireInput {
    id: Value,
    index: Option<u64>,
    payload: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireProof {
    output_index: u64,
    #[serde(default)]
    output_hashes_siblings: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct WireVoucher {
    index: u64,
    destination: Option<String>,
    payload: Option<String>,
    value: Option<String>,
    input: Option<WireInput>,
    proof: Option<WireProof>,
    executed: Option<bool>,
}

fn malformed(what: &str, err: impl std::fmt::Display) -> RollupsError {
    RollupsError::Repository(format!("malformed {}: {}", what, err))
}

fn parse_bytes(hex: Option<&str>) -> Result<Bytes> {
    match hex {
        None => Ok(Bytes::new()),
        Some(hex) => hex_to_bytes(hex).map(Bytes::from).map_err(|e| malformed("payload", e)),
    }
}

impl WireVoucher {
    fn into_summary(self) -> Result<VoucherSummary> {
        Ok(VoucherSummary {
            index: self.index,
            destination: match self.destination.as_deref() {
                Some(addr) if !addr.is_empty() => {
                    addr.parse::<Address>().map_err(|e| malformed("destination", e))?
                }
                _ => Address::ZERO,
            },
            value: match self.value.as_deref() {
                Some(value) => hex_to_u256(value).map_err(|e| malformed("value", e))?,
                None => Default::default(),
            },
            payload: parse_bytes(self.payload.as_deref())?,
            input: self
                .input
                .map(|input| -> Result<InputRef> {
                    Ok(InputRef {
                        id: match input.id {
                            Value::String(s) => s,
                            other => other.to_string(),
                        },
                        index: input.index,
                        payload: parse_bytes(input.payload.as_deref())?,
                    })
                })
                .transpose()?,
        })
    }

    fn into_detail(mut self) -> Result<VoucherDetail> {
        let proof = self
            .proof
            .take()
            .map(|p| -> Result<OutputProof> {
                let siblings = p
                    .output_hashes_siblings
                    .iter()
                    .map(|h| h.parse::<B256>().map_err(|e| malformed("proof sibling", e)))
                    .collect::<Result<Vec<_>>>()?;
                Ok(OutputProof {
                    output_index: p.output_index,
                    output_hashes_siblings: siblings,
                })
            })
            .transpose()?;
        let executed = self.executed.unwrap_or(false);
        Ok(VoucherDetail {
            summary: self.into_summary()?,
            proof,
            executed,
        })
    }
}

fn is_not_found(errors: &[GraphqlError]) -> bool {
    errors.iter().any(|e| e.message.to_lowercase().contains("not found"))
}

fn first_error(errors: &[GraphqlError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "empty response".into())
}

fn parse_vouchers_page(body: Value) -> Result<(Vec<VoucherSummary>, PageInfo)> {
    let resp: GraphqlResponse<VouchersData> =
        serde_json::from_value(body).map_err(|e| malformed("vouchers response", e))?;
    let data = resp
        .data
        .ok_or_else(|| RollupsError::Repository(first_error(&resp.errors)))?;
    let vouchers = data
        .vouchers
        .edges
        .into_iter()
        .map(|edge| edge.node.into_summary())
        .collect::<Result<Vec<_>>>()?;
    Ok((vouchers, data.vouchers.page_info))
}

fn parse_voucher(body: Value) -> Result<Option<VoucherDetail>> {
    let resp: GraphqlResponse<VoucherData> =
        serde_json::from_value(body).map_err(|e| malformed("voucher response", e))?;
    match resp.data {
        Some(VoucherData { voucher: Some(voucher) }) => voucher.into_detail().map(Some),
        Some(VoucherData { voucher: None }) => Ok(None),
        None if is_not_found(&resp.errors) => Ok(None),
        None => Err(RollupsError::Repository(first_error(&resp.errors))),
    }
}

/// GraphQL indexer client bound to one application endpoint.
pub struct GraphqlClient {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
    page_size: u64,
}

impl GraphqlClient {
    pub fn new(endpoint: &str, timeout_ms: Option<u64>, page_size: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(20_000);
        Self {
            endpoint: endpoint.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
            page_size: page_size.unwrap_or(100).max(1),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(&self, query: &str, variables: Value) -> Result<Value> {
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&GraphqlRequest { query, variables })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| RollupsError::Repository(format!("indexer request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(RollupsError::Repository(format!(
                "indexer returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| RollupsError::Repository(format!("failed to parse indexer response: {}", e)))
    }
}

#[async_trait]
impl VoucherRepository for GraphqlClient {
    /// Fetch every page; nothing is returned unless all pages succeed.
    async fn list_vouchers(&self) -> Result<Vec<VoucherSummary>> {
        let mut vouchers = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let body = self
                .post(
                    VOUCHERS_QUERY,
                    json!({ "first": self.page_size, "after": after }),
                )
                .await?;
            let (page, info) = parse_vouchers_page(body)?;
            let count = page.len();
            vouchers.extend(page);

            debug!(endpoint = %self.endpoint, downloaded = vouchers.len(), "voucher page");

            match info.end_cursor {
                Some(cursor) if info.has_next_page && count > 0 => after = Some(cursor),
                _ => break,
            }
        }

        sort_for_display(&mut vouchers);
        Ok(vouchers)
    }

    async fn get_voucher(&self, index: u64) -> Result<Option<VoucherDetail>> {
        let body = self
            .post(VOUCHER_QUERY, json!({ "outputIndex": index }))
            .await?;
        parse_voucher(body)
    }
}

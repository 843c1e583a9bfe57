//! Chain registry and client settings.
//!
//! A chain is usable for reads as soon as it has an RPC url. Voucher listing
//! additionally needs a node (indexer) url, and relay submission a relay url.

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::{RollupsError, Result};

pub const MAINNET_CHAIN_ID: u64 = 1;
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;
pub const DEVNET_CHAIN_ID: u64 = 31_337;

/// Deployed rollups contracts (deterministic deployment addresses by default).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollupsContracts {
    pub input_box: Address,
    pub ether_portal: Address,
    pub erc20_portal: Address,
    pub erc721_portal: Address,
    pub erc1155_single_portal: Address,
    pub erc1155_batch_portal: Address,
}

impl Default for RollupsContracts {
    fn default() -> Self {
        Self {
            input_box: address!("593e5bcf894d6829dd26d0810da7f064406aebb6"),
            ether_portal: address!("c70076a466789b595b50959cdc261227f0d70051"),
            erc20_portal: address!("c700d6add016eecd59d989c028214eaa0fcc0051"),
            erc721_portal: address!("c700d52f5290e978e9cae7d1e092935263b60051"),
            erc1155_single_portal: address!("c700a261279afc6f755a3a67d86ae43e2ebd0051"),
            erc1155_batch_portal: address!("c700a2e5531e720a2434433b6ccf4c0ea2400051"),
        }
    }
}

/// Per-chain configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub name: String,
    pub rpc_url: String,
    /// Rollups node base url; the indexer lives at `{node_url}/graphql/{app}`.
    #[serde(default)]
    pub node_url: Option<String>,
    /// Off-chain relay base url (`/nonce`, `/submit`).
    #[serde(default)]
    pub relay_url: Option<String>,
    #[serde(default)]
    pub contracts: RollupsContracts,
}

impl ChainConfig {
    /// GraphQL endpoint of the indexer for `app` on this chain.
    pub fn indexer_url(&self, app: &Address) -> Result<String> {
        let node_url = self.node_url.as_deref().ok_or_else(|| {
            RollupsError::Configuration(format!("no chain graphql url for {}", self.name))
        })?;
        Ok(format!("{}/graphql/{:#x}", node_url.trim_end_matches('/'), app))
    }

    pub fn relay_base_url(&self) -> Result<&str> {
        self.relay_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .ok_or_else(|| {
                RollupsError::Configuration(format!("no relay url for {}", self.name))
            })
    }
}

/// Client-side timing knobs.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub request_timeout_ms: u64,
    /// Blocks to wait for before a transaction counts as confirmed.
    pub confirmations: u64,
    pub receipt_poll_ms: u64,
    pub receipt_max_polls: u32,
    pub relay_max_gas_price: u128,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 20_000,
            confirmations: 1,
            receipt_poll_ms: 1_000,
            receipt_max_polls: 120,
            relay_max_gas_price: 10,
        }
    }
}

#[derive(Deserialize)]
struct RegistryFile {
    #[serde(default)]
    chains: Vec<ChainConfig>,
}

/// Known chains, keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: Vec<ChainConfig>,
}

impl ChainRegistry {
    pub fn new(chains: Vec<ChainConfig>) -> Self {
        let mut registry = Self::default();
        for chain in chains {
            registry.insert(chain);
        }
        registry
    }

    /// Mainnet, Sepolia and a local devnet; only the devnet has a node and relay.
    pub fn with_defaults() -> Self {
        Self::new(vec![
            ChainConfig {
                chain_id: MAINNET_CHAIN_ID,
                name: "Ethereum".into(),
                rpc_url: "https://cloudflare-eth.com".into(),
                node_url: None,
                relay_url: None,
                contracts: RollupsContracts::default(),
            },
            ChainConfig {
                chain_id: SEPOLIA_CHAIN_ID,
                name: "Sepolia".into(),
                rpc_url: "https://gateway.tenderly.co/public/sepolia".into(),
                node_url: None,
                relay_url: None,
                contracts: RollupsContracts::default(),
            },
            ChainConfig {
                chain_id: DEVNET_CHAIN_ID,
                name: "Anvil".into(),
                rpc_url: "http://127.0.0.1:8545".into(),
                node_url: Some("http://localhost:8080".into()),
                relay_url: Some("http://localhost:8080".into()),
                contracts: RollupsContracts::default(),
            },
        ])
    }

    /// Load a registry from a TOML document with a `[[chains]]` array.
    pub fn from_toml(source: &str) -> Result<Self> {
        let file: RegistryFile = toml::from_str(source)
            .map_err(|e| RollupsError::Configuration(format!("invalid chain registry: {}", e)))?;
        Ok(Self::new(file.chains))
    }

    /// Add or replace a chain.
    pub fn insert(&mut self, chain: ChainConfig) {
        if let Some(existing) = self.chains.iter_mut().find(|c| c.chain_id == chain.chain_id) {
            *existing = chain;
        } else {
            self.chains.push(chain);
        }
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainConfig> {
        self.chains.iter().find(|c| c.chain_id == chain_id)
    }

    pub fn resolve(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.get(chain_id)
            .ok_or_else(|| RollupsError::Configuration(format!("unknown chain id {}", chain_id)))
    }

    /// Resolve a wallet-style chain id string (`"0x7a69"` or `"31337"`).
    pub fn resolve_str(&self, chain_id: &str) -> Result<&ChainConfig> {
        let id = parse_chain_id(chain_id).ok_or_else(|| {
            RollupsError::Configuration(format!("invalid chain id {:?}", chain_id))
        })?;
        self.resolve(id)
    }

    /// Indexer endpoint for `app` on `chain_id`; fails before any network call.
    pub fn resolve_indexer(&self, chain_id: u64, app: &Address) -> Result<String> {
        self.resolve(chain_id)?.indexer_url(app)
    }

    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }
}

/// Parse a chain id given as 0x-hex or decimal.
pub fn parse_chain_id(s: &str) -> Option<u64> {
    let s = s.trim();
    match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(digits) => u64::from_str_radix(digits, 16).ok(),
        None => s.parse().ok(),
    }
}

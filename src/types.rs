use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Blockchain ecosystem family a connector or adapter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    Evm,
    Solana,
    /// Declared ahead of a shipped adapter; has no fallback extraction rule.
    Sui,
}

impl AdapterKind {
    /// Every kind known at compile time, in display order.
    pub const ALL: [AdapterKind; 3] = [AdapterKind::Evm, AdapterKind::Solana, AdapterKind::Sui];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Evm => "evm",
            AdapterKind::Solana => "solana",
            AdapterKind::Sui => "sui",
        }
    }

    /// Derives the owning kind from a `"<kind>:<wallet>"` connector identifier.
    pub fn from_connector_type(connector_type: &str) -> Option<Self> {
        let prefix = connector_type.split(':').next()?;
        prefix.parse().ok()
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdapterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "evm" => Ok(AdapterKind::Evm),
            "solana" => Ok(AdapterKind::Solana),
            "sui" => Ok(AdapterKind::Sui),
            other => Err(format!("unknown adapter kind: {}", other)),
        }
    }
}

/// Load status of one adapter kind inside the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterStatus {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// Network identifier, only unique within one adapter kind.
///
/// EVM networks use numeric chain ids, cluster based networks use monikers
/// such as `mainnet-beta`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChainId {
    Numeric(u64),
    Named(String),
}

impl ChainId {
    pub fn is_numeric(&self) -> bool {
        matches!(self, ChainId::Numeric(_))
    }

    pub fn is_named(&self) -> bool {
        matches!(self, ChainId::Named(_))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainId::Numeric(id) => write!(f, "{}", id),
            ChainId::Named(name) => f.write_str(name),
        }
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId::Numeric(id)
    }
}

impl From<&str> for ChainId {
    fn from(name: &str) -> Self {
        ChainId::Named(name.to_string())
    }
}

impl From<String> for ChainId {
    fn from(name: String) -> Self {
        ChainId::Named(name)
    }
}

/// A single wallet connection mechanism scoped to one adapter kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connector {
    /// Human wallet name, e.g. "Phantom".
    pub name: String,
    /// Kind this connector belongs to.
    pub adapter: AdapterKind,
    /// Identifier handed to the connection store, `"<kind>:<wallet>"`.
    pub connector_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Connector {
    pub fn new(name: &str, adapter: AdapterKind) -> Self {
        let wallet = name.trim().to_lowercase().replace(char::is_whitespace, "-");
        Self {
            name: name.to_string(),
            adapter,
            connector_type: connector_type(adapter, &wallet),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn with_connector_type(mut self, connector_type: &str) -> Self {
        self.connector_type = connector_type.to_string();
        self
    }
}

/// Builds a `"<kind>:<wallet>"` connector identifier.
pub fn connector_type(kind: AdapterKind, wallet: &str) -> String {
    format!("{}:{}", kind, wallet)
}

/// EVM network declared by the application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmChain {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,
}

impl EvmChain {
    pub fn new(id: u64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            rpc_url: None,
        }
    }
}

/// Chain configuration declared by the application, per ecosystem.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppChainConfig {
    /// Networks offered for EVM wallets.
    #[serde(default)]
    pub evm_chains: Vec<EvmChain>,
    /// Cluster moniker to RPC url for Solana wallets.
    #[serde(default)]
    pub solana_rpc_urls: BTreeMap<String, String>,
}

impl AppChainConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_evm_chain(mut self, chain: EvmChain) -> Self {
        self.evm_chains.push(chain);
        self
    }

    pub fn with_solana_cluster(mut self, cluster: &str, rpc_url: &str) -> Self {
        self.solana_rpc_urls
            .insert(cluster.to_string(), rpc_url.to_string());
        self
    }
}

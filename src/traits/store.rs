use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ConnectError;
use crate::traits::AdapterCapability;
use crate::types::{AdapterKind, ChainId, Connector};

/// Live wallet session as reported by the connection store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveConnection {
    pub is_connected: bool,
    pub address: Option<String>,
    pub connector_type: String,
}

/// Arguments of a connect call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectRequest {
    pub connector_type: String,
    pub chain_id: Option<ChainId>,
}

/// Externally owned wallet connection state.
///
/// The orchestrator only reads the session and error fields and invokes
/// `connect`; the store is expected to populate its own error field when a
/// connect fails.
#[async_trait]
pub trait ConnectionStore: Send + Sync {
    fn active_connection(&self) -> Option<ActiveConnection>;

    fn wallet_connection_error(&self) -> Option<String>;

    async fn connect(&self, request: ConnectRequest) -> Result<(), ConnectError>;

    /// Raw connectors, per ecosystem.
    fn connectors(&self) -> HashMap<AdapterKind, Vec<Connector>>;

    /// Adapter instance the store holds for a kind, if any.
    fn adapter(&self, kind: AdapterKind) -> Option<Arc<dyn AdapterCapability>>;
}

/// One entry of a time-ordered recent wallet list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentWallet {
    pub kind: AdapterKind,
    pub name: String,
    pub timestamp: u64,
}

/// The two shapes recent wallet data is persisted in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecentWallets {
    /// walletName -> used flag, per ecosystem.
    ByKind(HashMap<AdapterKind, HashMap<String, bool>>),
    /// Sorted by time, most recent first.
    Ordered(Vec<RecentWallet>),
}

/// Read-only access to recently connected wallets.
pub trait RecentWalletStore: Send + Sync {
    fn recent_connected_wallets(&self) -> Option<RecentWallets>;
}

/// What the user typed on the impersonation screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImpersonationTarget {
    RawAddress(String),
    /// Human readable name the helper store resolves itself.
    Name(String),
}

impl ImpersonationTarget {
    pub fn as_str(&self) -> &str {
        match self {
            ImpersonationTarget::RawAddress(value) | ImpersonationTarget::Name(value) => value,
        }
    }
}

/// Helper store that backs the read-only impersonated connector.
pub trait ImpersonationStore: Send + Sync {
    fn set_impersonated(&self, kind: AdapterKind, target: ImpersonationTarget);
}

/// Hooks into the modal hosting the flow.
pub trait ModalControl: Send + Sync {
    fn close_modal(&self);

    fn open_link(&self, url: &str);
}

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::types::{AdapterKind, AppChainConfig, ChainId};

/// Operations one ecosystem's adapter provides to the orchestrator.
///
/// Instances are created by an [`AdapterLoader`] and owned by the registry
/// once loaded. The optional lookups default to "not offered" so an adapter
/// only implements what its ecosystem supports.
#[async_trait]
pub trait AdapterCapability: Send + Sync {
    /// Ecosystem this capability serves.
    fn kind(&self) -> AdapterKind;

    /// Lists the chains the application supports for this ecosystem.
    ///
    /// `prior` carries chains already shown to the user; an adapter may
    /// honor it to keep the list stable. Synchronous so cached adapters can
    /// answer without suspending.
    fn get_chains(
        &self,
        config: &AppChainConfig,
        prior: Option<&[ChainId]>,
    ) -> Result<Vec<ChainId>, AdapterError>;

    /// Whether every entry is a chain id of this ecosystem.
    fn is_chain_list(&self, chains: &[ChainId]) -> bool;

    /// Reverse-resolves a human readable name for an address.
    async fn get_name(&self, _address: &str) -> Result<Option<String>, AdapterError> {
        Ok(None)
    }

    /// Resolves an avatar url for a previously resolved name.
    async fn get_avatar(&self, _name: &str) -> Result<Option<String>, AdapterError> {
        Ok(None)
    }

    /// Clusters this adapter can connect to, `None` when the ecosystem has no clusters.
    fn get_available_clusters(&self) -> Option<Vec<String>> {
        None
    }

    /// Cluster validation, `None` when not offered.
    fn is_valid_cluster(&self, _name: &str) -> Option<bool> {
        None
    }
}

impl std::fmt::Debug for dyn AdapterCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterCapability")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Produces the capability for one adapter kind on first use.
///
/// Stands in for deferred module loading: the registry calls `load` at most
/// once at a time per kind and caches the result.
#[async_trait]
pub trait AdapterLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn AdapterCapability>, AdapterError>;
}

/// Loader for a capability that is already constructed.
pub struct ReadyLoader {
    capability: Arc<dyn AdapterCapability>,
}

impl ReadyLoader {
    pub fn new(capability: Arc<dyn AdapterCapability>) -> Self {
        Self { capability }
    }
}

#[async_trait]
impl AdapterLoader for ReadyLoader {
    async fn load(&self) -> Result<Arc<dyn AdapterCapability>, AdapterError> {
        Ok(self.capability.clone())
    }
}

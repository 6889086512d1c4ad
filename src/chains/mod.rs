//! Chain resolution routed through the owning adapter.
//!
//! Every query asks the registry for the adapter of the connector's kind and
//! degrades to [`fallback`] when the adapter is missing or fails. Nothing in
//! here returns an error; degraded answers are logged as warnings.

pub mod fallback;

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::registry::AdapterRegistry;
use crate::traits::AdapterCapability;
use crate::types::{AdapterKind, AppChainConfig, ChainId};

/// Answers "which chains does this wallet/app support" per ecosystem.
#[derive(Debug, Clone)]
pub struct ChainResolver {
    registry: AdapterRegistry,
    config: Arc<AppChainConfig>,
}

impl ChainResolver {
    pub fn new(registry: AdapterRegistry, config: AppChainConfig) -> Self {
        Self {
            registry,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AppChainConfig {
        &self.config
    }

    /// Chains for a `"<kind>:<wallet>"` connector, waiting for the adapter to load.
    #[instrument(skip(self, prior))]
    pub async fn resolve_chains(&self, connector_type: &str, prior: Option<&[ChainId]>) -> Vec<ChainId> {
        match AdapterKind::from_connector_type(connector_type) {
            Some(kind) => self.resolve_kind_chains(kind, prior).await,
            None => {
                warn!("Unknown connector type {}, no chains", connector_type);
                Vec::new()
            }
        }
    }

    /// Same as [`resolve_chains`](Self::resolve_chains) but only consults
    /// adapters that are already loaded.
    pub fn resolve_chains_sync(&self, connector_type: &str, prior: Option<&[ChainId]>) -> Vec<ChainId> {
        match AdapterKind::from_connector_type(connector_type) {
            Some(kind) => {
                let capability = self.registry.get_loaded_adapter(kind);
                self.chains_from(kind, capability, prior)
            }
            None => {
                warn!("Unknown connector type {}, no chains", connector_type);
                Vec::new()
            }
        }
    }

    pub async fn resolve_kind_chains(&self, kind: AdapterKind, prior: Option<&[ChainId]>) -> Vec<ChainId> {
        let capability = self.registry.get_adapter(kind).await;
        self.chains_from(kind, capability, prior)
    }

    /// First chain offered for `kind`, used as the default connect target.
    pub async fn initial_chain(&self, kind: AdapterKind) -> Option<ChainId> {
        self.resolve_kind_chains(kind, None).await.into_iter().next()
    }

    pub async fn is_chain_list(&self, kind: AdapterKind, chains: &[ChainId]) -> bool {
        match self.registry.get_adapter(kind).await {
            Some(capability) => capability.is_chain_list(chains),
            None => {
                warn!("{} adapter unavailable, validating chain list by shape", kind);
                fallback::is_chain_list(kind, chains)
            }
        }
    }

    pub fn is_chain_list_sync(&self, kind: AdapterKind, chains: &[ChainId]) -> bool {
        match self.registry.get_loaded_adapter(kind) {
            Some(capability) => capability.is_chain_list(chains),
            None => fallback::is_chain_list(kind, chains),
        }
    }

    pub async fn available_clusters(&self, kind: AdapterKind) -> Vec<String> {
        let offered = self
            .registry
            .get_adapter(kind)
            .await
            .and_then(|capability| capability.get_available_clusters());
        match offered {
            Some(clusters) => clusters,
            None => {
                debug!("Using configured clusters for {}", kind);
                fallback::available_clusters(kind, &self.config)
            }
        }
    }

    pub async fn is_valid_cluster(&self, kind: AdapterKind, name: &str) -> bool {
        let verdict = self
            .registry
            .get_adapter(kind)
            .await
            .and_then(|capability| capability.is_valid_cluster(name));
        match verdict {
            Some(valid) => valid,
            None => self
                .available_clusters(kind)
                .await
                .iter()
                .any(|cluster| cluster == name),
        }
    }

    fn chains_from(
        &self,
        kind: AdapterKind,
        capability: Option<Arc<dyn AdapterCapability>>,
        prior: Option<&[ChainId]>,
    ) -> Vec<ChainId> {
        match capability {
            Some(capability) => match capability.get_chains(&self.config, prior) {
                Ok(chains) => return chains,
                Err(e) => warn!("{} adapter failed to list chains, using config: {}", kind, e),
            },
            None => warn!("{} adapter unavailable, using configured chains", kind),
        }
        fallback::chains(kind, &self.config)
    }
}

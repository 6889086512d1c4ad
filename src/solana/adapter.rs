use async_trait::async_trait;

use crate::error::AdapterError;
use crate::evm::adapter::retain_prior;
use crate::solana::types::KNOWN_CLUSTERS;
use crate::traits::AdapterCapability;
use crate::types::{AdapterKind, AppChainConfig, ChainId};

/// Built-in capability for Solana wallets; chains are cluster monikers.
#[derive(Debug, Clone, Default)]
pub struct SolanaCapability;

impl SolanaCapability {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AdapterCapability for SolanaCapability {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Solana
    }

    fn get_chains(
        &self,
        config: &AppChainConfig,
        prior: Option<&[ChainId]>,
    ) -> Result<Vec<ChainId>, AdapterError> {
        let configured: Vec<ChainId> = config
            .solana_rpc_urls
            .keys()
            .map(|cluster| ChainId::Named(cluster.clone()))
            .collect();
        Ok(retain_prior(configured, prior))
    }

    fn is_chain_list(&self, chains: &[ChainId]) -> bool {
        chains.iter().all(ChainId::is_named)
    }

    fn get_available_clusters(&self) -> Option<Vec<String>> {
        Some(KNOWN_CLUSTERS.iter().map(|c| c.to_string()).collect())
    }

    fn is_valid_cluster(&self, name: &str) -> Option<bool> {
        Some(KNOWN_CLUSTERS.contains(&name))
    }
}

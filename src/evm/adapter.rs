use std::collections::HashMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::AdapterError;
use crate::traits::AdapterCapability;
use crate::types::{AdapterKind, AppChainConfig, ChainId};

/// Built-in capability for EVM wallets.
///
/// Chains come from the application config. Name lookups are served from an
/// optional in-memory address book; live reverse resolution belongs to a
/// network-backed adapter.
#[derive(Debug, Clone, Default)]
pub struct EvmCapability {
    /// Lowercased address to name
    names: HashMap<String, String>,
    /// Name to avatar url
    avatars: HashMap<String, String>,
}

impl EvmCapability {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_known_name(mut self, address: &str, name: &str) -> Self {
        self.names.insert(address.to_lowercase(), name.to_string());
        self
    }

    pub fn with_avatar(mut self, name: &str, url: &str) -> Self {
        self.avatars.insert(name.to_string(), url.to_string());
        self
    }
}

#[async_trait]
impl AdapterCapability for EvmCapability {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Evm
    }

    fn get_chains(
        &self,
        config: &AppChainConfig,
        prior: Option<&[ChainId]>,
    ) -> Result<Vec<ChainId>, AdapterError> {
        let configured: Vec<ChainId> = config
            .evm_chains
            .iter()
            .map(|chain| ChainId::Numeric(chain.id))
            .collect();
        Ok(retain_prior(configured, prior))
    }

    fn is_chain_list(&self, chains: &[ChainId]) -> bool {
        chains.iter().all(ChainId::is_numeric)
    }

    async fn get_name(&self, address: &str) -> Result<Option<String>, AdapterError> {
        debug!("Looking up name for {}", address);
        Ok(self.names.get(&address.to_lowercase()).cloned())
    }

    async fn get_avatar(&self, name: &str) -> Result<Option<String>, AdapterError> {
        Ok(self.avatars.get(name).cloned())
    }
}

/// Keeps the prior selection where it is still configured, otherwise the full list.
pub(crate) fn retain_prior(configured: Vec<ChainId>, prior: Option<&[ChainId]>) -> Vec<ChainId> {
    let kept: Vec<ChainId> = prior
        .unwrap_or_default()
        .iter()
        .filter(|chain| configured.contains(chain))
        .cloned()
        .collect();
    if kept.is_empty() {
        configured
    } else {
        kept
    }
}

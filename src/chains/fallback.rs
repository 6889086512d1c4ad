//! Dependency-free answers used when an adapter cannot be loaded.

use crate::types::{AdapterKind, AppChainConfig, ChainId};

/// Chains declared in the application config for `kind`.
pub fn chains(kind: AdapterKind, config: &AppChainConfig) -> Vec<ChainId> {
    match kind {
        AdapterKind::Evm => config
            .evm_chains
            .iter()
            .map(|chain| ChainId::Numeric(chain.id))
            .collect(),
        AdapterKind::Solana => config
            .solana_rpc_urls
            .keys()
            .map(|cluster| ChainId::Named(cluster.clone()))
            .collect(),
        AdapterKind::Sui => Vec::new(),
    }
}

/// Type-shape heuristic. Empty lists pass for kinds that have a heuristic.
pub fn is_chain_list(kind: AdapterKind, chains: &[ChainId]) -> bool {
    match kind {
        AdapterKind::Evm => chains.iter().all(ChainId::is_numeric),
        AdapterKind::Solana => chains.iter().all(ChainId::is_named),
        AdapterKind::Sui => false,
    }
}

pub fn available_clusters(kind: AdapterKind, config: &AppChainConfig) -> Vec<String> {
    match kind {
        AdapterKind::Solana => config.solana_rpc_urls.keys().cloned().collect(),
        AdapterKind::Evm | AdapterKind::Sui => Vec::new(),
    }
}

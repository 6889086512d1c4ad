use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::flow::FlowConfig;
use crate::identity::IdentityConfig;
use crate::registry::RegistryConfig;
use crate::types::AppChainConfig;

/// Everything an embedding application configures, in one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    pub registry: RegistryConfig,
    pub flow: FlowConfig,
    pub identity: IdentityConfig,
    pub chains: AppChainConfig,
}

impl OrchestratorConfig {
    /// Parses and validates a JSON document; missing sections take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.flow.poll_interval.is_zero() {
            return Err(ConfigError::Invalid("poll interval must be non-zero".into()));
        }
        if self.flow.poll_interval >= self.flow.connect_timeout {
            return Err(ConfigError::Invalid(
                "poll interval must be shorter than the connect timeout".into(),
            ));
        }

        let mut seen = HashSet::new();
        for chain in &self.chains.evm_chains {
            if !seen.insert(chain.id) {
                return Err(ConfigError::Invalid(format!("duplicate EVM chain id {}", chain.id)));
            }
        }
        if self.chains.solana_rpc_urls.keys().any(|cluster| cluster.trim().is_empty()) {
            return Err(ConfigError::Invalid("empty Solana cluster name".into()));
        }
        Ok(())
    }
}

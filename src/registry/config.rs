use std::time::Duration;
use serde::{Serialize, Deserialize};

use crate::types::AdapterKind;

/// Configuration for the adapter registry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Budget for a single adapter load, unbounded when `None`
    #[serde(default)]
    pub load_timeout: Option<Duration>,

    /// Kinds warmed up by `preload_configured`
    #[serde(default)]
    pub preload: Vec<AdapterKind>,
}

impl RegistryConfig {
    /// Create a new registry configuration
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = Some(timeout);
        self
    }

    pub fn with_preload(mut self, kinds: Vec<AdapterKind>) -> Self {
        self.preload = kinds;
        self
    }
}

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{AdapterKind, ChainId};

/// Delay between a confirmed connection and closing the modal
pub const CLOSE_DELAY: Duration = Duration::from_millis(400);

/// Delay between a confirmed connection and clearing `is_connected`
pub const CLEAR_CONNECTED_DELAY: Duration = Duration::from_millis(500);

/// Wallet name that opens the impersonation screen
pub const IMPERSONATION_WALLET: &str = "impersonate";

/// Connection flow configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// How often the store is polled for a live connection
    pub poll_interval: Duration,

    /// Budget for the wallet to report a live connection
    pub connect_timeout: Duration,

    /// Chain requested when connecting through a kind
    pub initial_chains: HashMap<AdapterKind, ChainId>,

    pub impersonation_wallet_name: String,

    pub get_wallet_url: String,

    pub about_url: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            connect_timeout: Duration::from_secs(30),
            initial_chains: HashMap::new(),
            impersonation_wallet_name: IMPERSONATION_WALLET.to_string(),
            get_wallet_url: "https://ethereum.org/en/wallets/find-wallet/".to_string(),
            about_url: "https://ethereum.org/en/wallets/".to_string(),
        }
    }
}

impl FlowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_initial_chain(mut self, kind: AdapterKind, chain: ChainId) -> Self {
        self.initial_chains.insert(kind, chain);
        self
    }

    pub fn with_impersonation_wallet_name(mut self, name: &str) -> Self {
        self.impersonation_wallet_name = name.to_string();
        self
    }

    pub fn with_links(mut self, get_wallet_url: &str, about_url: &str) -> Self {
        self.get_wallet_url = get_wallet_url.to_string();
        self.about_url = about_url.to_string();
        self
    }
}

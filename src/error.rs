use std::time::Duration;

use crate::types::AdapterKind;

/// Errors raised while loading or querying an adapter capability.
#[derive(thiserror::Error, Debug)]
pub enum AdapterError {
    /// The adapter module failed to load
    #[error("Failed to load {kind} adapter: {reason}")]
    Load { kind: AdapterKind, reason: String },

    /// No loader was registered for the kind
    #[error("No loader registered for {0} adapter")]
    MissingLoader(AdapterKind),

    /// Loading exceeded the configured budget
    #[error("Loading {0} adapter timed out")]
    LoadTimeout(AdapterKind),

    #[error("Other: {0}")]
    Other(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

/// Errors raised by a single connect attempt.
#[derive(thiserror::Error, Debug)]
pub enum ConnectError {
    /// The connection store rejected the request
    #[error("Connection store error: {0}")]
    Store(String),

    /// The wallet never reported a live connection
    #[error("Wallet did not connect within {0:?}")]
    Timeout(Duration),

    /// The flow was torn down mid-attempt
    #[error("Connect attempt cancelled")]
    Cancelled,
}

/// Errors raised while reading orchestrator configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<String> for AdapterError {
    fn from(error: String) -> Self {
        AdapterError::Other(error)
    }
}

impl From<&str> for AdapterError {
    fn from(error: &str) -> Self {
        AdapterError::Other(error.to_string())
    }
}

impl From<String> for ConnectError {
    fn from(error: String) -> Self {
        ConnectError::Store(error)
    }
}

impl From<&str> for ConnectError {
    fn from(error: &str) -> Self {
        ConnectError::Store(error.to_string())
    }
}

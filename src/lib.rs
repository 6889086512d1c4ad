//! Multi-chain wallet connection orchestrator
//!
//! Lets one connection UI serve several mutually incompatible blockchain
//! ecosystems: adapters are loaded lazily and cached by the
//! [`AdapterRegistry`], chain lists are resolved through the owning adapter
//! by the [`ChainResolver`], wallets are merged across ecosystems by
//! [`grouping`], and the [`ConnectionFlow`] drives the modal from wallet
//! selection to a confirmed connection.

pub mod chains;
pub mod config;
pub mod error;
pub mod flow;
pub mod grouping;
pub mod identity;
pub mod registry;
pub mod traits;
pub mod types;
pub mod utils;

pub mod evm;
pub mod solana;

#[cfg(test)]
mod mocks;

pub use chains::ChainResolver;
pub use config::OrchestratorConfig;
pub use error::{AdapterError, ConfigError, ConnectError};
pub use flow::{ConnectionFlow, ConnectionFlowState, ContentType, FlowConfig, FlowOutcome};
pub use grouping::GroupedConnector;
pub use identity::{abbreviate, IdentityConfig, NameAvatarResolver, NameAvatarResult};
pub use registry::{AdapterRegistry, RegistryConfig};
pub use traits::*;
pub use types::*;

pub type Result<T> = std::result::Result<T, AdapterError>;

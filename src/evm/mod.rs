pub mod adapter;
pub mod types;

pub use adapter::EvmCapability;
pub use types::is_address;

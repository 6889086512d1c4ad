pub mod adapter;
pub mod types;

pub use adapter::SolanaCapability;
pub use types::is_address;

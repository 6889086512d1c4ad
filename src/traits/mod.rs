pub mod capabilities;
pub mod store;

pub use capabilities::*;
pub use store::*;

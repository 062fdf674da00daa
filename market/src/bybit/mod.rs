pub mod client;
pub mod types;

pub use client::{BybitClient, BybitConfig};
pub use types::*;

//! Market data collaborators for the RSI monitor.
//!
//! The monitor only depends on the [`SymbolProvider`] and [`IndicatorSource`]
//! traits; [`bybit::BybitClient`] is the production implementation of both.

pub mod api;
pub mod bybit;
pub mod errors;
pub mod rsi;
pub mod types;

pub use api::{IndicatorSource, SymbolProvider};
pub use errors::MarketError;
pub use types::Timeframe;

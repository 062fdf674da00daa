use async_trait::async_trait;

use crate::errors::MarketError;
use crate::types::Timeframe;

/// Lists the instruments the monitor should scan.
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn list_symbols(&self) -> Result<Vec<String>, MarketError>;
}

/// Produces the latest RSI value for a symbol.
///
/// `Ok(None)` means the indicator is unavailable (no candles, or a value
/// outside `[0, 100]`). Transport and history problems are reported as `Err`.
#[async_trait]
pub trait IndicatorSource: Send + Sync {
    async fn rsi(
        &self,
        symbol: &str,
        period: usize,
        timeframe: Timeframe,
    ) -> Result<Option<f64>, MarketError>;
}

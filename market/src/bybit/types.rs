use serde::Deserialize;

use crate::errors::MarketError;
use crate::types::Candle;

/// Common v5 response wrapper. On errors Bybit sends `result: {}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub ret_code: i64,
    #[serde(default)]
    pub ret_msg: String,
    #[serde(default)]
    pub result: Option<T>,
}

impl<T> Envelope<T> {
    pub fn into_result(self) -> Result<T, MarketError> {
        if self.ret_code != 0 {
            return Err(MarketError::Api {
                code: self.ret_code,
                message: self.ret_msg,
            });
        }

        self.result
            .ok_or_else(|| MarketError::InvalidResponse("missing result".into()))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentsPage {
    #[serde(default)]
    pub list: Vec<Instrument>,
    #[serde(default)]
    pub next_page_cursor: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instrument {
    pub symbol: String,
    #[serde(default)]
    pub contract_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub quote_coin: String,
}

impl Instrument {
    /// Live linear perpetual quoted in `quote`.
    pub fn is_scannable(&self, quote: &str) -> bool {
        self.contract_type == "LinearPerpetual"
            && self.status == "Trading"
            && self.symbol.ends_with(quote)
    }
}

/// Kline rows are positional string arrays:
/// `[startTime, open, high, low, close, volume, turnover]`, newest first.
#[derive(Debug, Default, Deserialize)]
pub struct KlinePage {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub list: Vec<Vec<String>>,
}

impl KlinePage {
    /// Parses the rows into candles sorted oldest first.
    pub fn into_candles(self) -> Result<Vec<Candle>, MarketError> {
        let mut candles = self
            .list
            .iter()
            .map(|row| parse_row(row))
            .collect::<Result<Vec<_>, _>>()?;

        candles.sort_by_key(|c| c.start_ms);
        Ok(candles)
    }
}

fn parse_row(row: &[String]) -> Result<Candle, MarketError> {
    let (Some(start), Some(close)) = (row.first(), row.get(4)) else {
        return Err(MarketError::InvalidResponse(format!(
            "kline row has {} fields",
            row.len()
        )));
    };

    let start_ms = start
        .parse::<u64>()
        .map_err(|e| MarketError::InvalidResponse(format!("start time {start:?}: {e}")))?;
    let close = close
        .parse::<f64>()
        .map_err(|e| MarketError::InvalidResponse(format!("close {close:?}: {e}")))?;

    Ok(Candle { start_ms, close })
}

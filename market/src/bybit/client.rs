use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::api::{IndicatorSource, SymbolProvider};
use crate::errors::MarketError;
use crate::rsi::latest_rsi;
use crate::types::{Candle, Timeframe};

use super::types::{Envelope, InstrumentsPage, KlinePage};

/// Upper bound on instrument pages followed through `nextPageCursor`.
const MAX_INSTRUMENT_PAGES: usize = 10;

#[derive(Clone, Debug)]
pub struct BybitConfig {
    pub base_url: String,
    /// Only symbols ending with this quote currency are scanned.
    pub quote_currency: String,
    /// Number of candles requested per kline call.
    pub kline_limit: usize,
    pub timeout: Duration,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".to_string(),
            quote_currency: "USDT".to_string(),
            kline_limit: 100,
            timeout: Duration::from_secs(10),
        }
    }
}

/// REST client for Bybit's public v5 market endpoints (linear category).
#[derive(Clone)]
pub struct BybitClient {
    http: Client,
    cfg: BybitConfig,
}

impl BybitClient {
    pub fn new(cfg: BybitConfig) -> Result<Self, MarketError> {
        let http = Client::builder()
            .timeout(cfg.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, cfg })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.trim_end_matches('/'), path)
    }

    /// Fetches every linear instrument, following pagination.
    #[instrument(skip(self), level = "debug")]
    pub async fn fetch_scannable_symbols(&self) -> Result<Vec<String>, MarketError> {
        let url = self.url("/v5/market/instruments-info");
        let mut symbols = Vec::new();
        let mut cursor = String::new();

        for _ in 0..MAX_INSTRUMENT_PAGES {
            let mut req = self
                .http
                .get(&url)
                .query(&[("category", "linear"), ("limit", "1000")]);
            if !cursor.is_empty() {
                req = req.query(&[("cursor", cursor.as_str())]);
            }

            let env: Envelope<InstrumentsPage> = req.send().await?.error_for_status()?.json().await?;
            let page = env.into_result()?;

            symbols.extend(
                page.list
                    .into_iter()
                    .filter(|i| i.is_scannable(&self.cfg.quote_currency))
                    .map(|i| i.symbol),
            );

            cursor = page.next_page_cursor;
            if cursor.is_empty() {
                break;
            }
        }

        if !cursor.is_empty() {
            warn!(
                pages = MAX_INSTRUMENT_PAGES,
                "instrument pagination truncated"
            );
        }

        symbols.sort();
        symbols.dedup();

        info!(
            count = symbols.len(),
            quote = %self.cfg.quote_currency,
            "scannable perpetuals fetched"
        );

        Ok(symbols)
    }

    /// Fetches the most recent candles for `symbol`, oldest first.
    #[instrument(skip(self), fields(symbol = %symbol), level = "debug")]
    pub async fn fetch_candles(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<Candle>, MarketError> {
        let limit = self.cfg.kline_limit.to_string();
        let env: Envelope<KlinePage> = self
            .http
            .get(self.url("/v5/market/kline"))
            .query(&[
                ("category", "linear"),
                ("symbol", symbol),
                ("interval", timeframe.bybit_interval()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let candles = env.into_result()?.into_candles()?;

        debug!(candles = candles.len(), "klines fetched");

        Ok(candles)
    }
}

#[async_trait]
impl SymbolProvider for BybitClient {
    async fn list_symbols(&self) -> Result<Vec<String>, MarketError> {
        self.fetch_scannable_symbols().await
    }
}

#[async_trait]
impl IndicatorSource for BybitClient {
    async fn rsi(
        &self,
        symbol: &str,
        period: usize,
        timeframe: Timeframe,
    ) -> Result<Option<f64>, MarketError> {
        let candles = self.fetch_candles(symbol, timeframe).await?;
        if candles.is_empty() {
            return Ok(None);
        }

        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        latest_rsi(symbol, &closes, period)
    }
}

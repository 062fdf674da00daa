use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarketError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("bybit api error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("invalid response from bybit: {0}")]
    InvalidResponse(String),

    #[error("insufficient history for {symbol}: have {have} closes, need {need}")]
    InsufficientHistory {
        symbol: String,
        have: usize,
        need: usize,
    },

    #[error("indicator error: {0}")]
    Indicator(String),
}

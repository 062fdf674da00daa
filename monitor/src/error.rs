use market::MarketError;
use thiserror::Error;

use crate::notifier::NotifyError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(#[from] MarketError),

    #[error("notification failed: {0}")]
    Notification(#[from] NotifyError),

    #[error("monitor stopped: {0}")]
    MonitorStopped(String),
}

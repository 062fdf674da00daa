//! Outbound message delivery.

pub mod log;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

pub use self::log::LogNotifier;
pub use telegram::TelegramNotifier;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("message rejected: {0}")]
    Rejected(String),
}

/// Delivers a formatted message to the single configured recipient.
///
/// `Ok` means the transport accepted the message. Callers do not retry
/// within the same scan cycle.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), NotifyError>;
}

use async_trait::async_trait;
use tracing::info;

use super::{Notifier, NotifyError};

/// Dry-run notifier: writes every message to the log and never fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        info!(
            target: "notifier",
            text = %message,
            chars = message.chars().count(),
            "notification logged"
        );
        Ok(())
    }
}

//! Outer boundary around the spawned run loop.

use std::future::Future;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::AppError;

/// Waits for either the shutdown signal or the run loop ending on its own.
///
/// On shutdown the stop flag is raised and the loop is awaited so the current
/// cycle winds down. If the loop ends first, or panics, that is reported as
/// [`AppError::MonitorStopped`] so the process exits non-zero.
pub async fn supervise<S>(
    mut handle: JoinHandle<()>,
    shutdown: S,
    stop: watch::Sender<bool>,
) -> Result<(), AppError>
where
    S: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        signal = shutdown => {
            signal?;
            info!("shutdown signal received");

            stop.send_replace(true);
            handle
                .await
                .map_err(|e| AppError::MonitorStopped(e.to_string()))
        }
        res = &mut handle => {
            let reason = match res {
                Ok(()) => "run loop returned without a stop request".to_string(),
                Err(e) => e.to_string(),
            };
            error!(%reason, "monitor stopped unexpectedly");
            Err(AppError::MonitorStopped(reason))
        }
    }
}

mod cli;

use std::sync::Arc;

use clap::Parser;
use market::bybit::BybitClient;
use monitor::{
    alert::AlertGate,
    clock::{Clock, SystemClock},
    config::AppConfig,
    notifier::{LogNotifier, Notifier, TelegramNotifier},
    scheduler::{CycleOutcome, Monitor, MonitorState, supervise},
};
use tokio::sync::watch;

use cli::Cli;

/// Picks the transport: Telegram normally, the log in dry-run mode.
fn build_notifier(cfg: &AppConfig) -> anyhow::Result<Arc<dyn Notifier>> {
    if cfg.dry_run {
        tracing::warn!("dry run: messages are logged, not sent");
        return Ok(Arc::new(LogNotifier));
    }

    // validate() guarantees both are present outside dry-run.
    let token = cfg.telegram_bot_token.clone().unwrap_or_default();
    let chat_id = cfg.telegram_chat_id.clone().unwrap_or_default();

    Ok(Arc::new(TelegramNotifier::new(
        cfg.telegram_api_base.clone(),
        token,
        chat_id,
        cfg.http_timeout(),
    )?))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_production = std::env::var("APP_ENV").unwrap_or_default() == "production";
    common::logger::init_logger("rsi-monitor", is_production);

    tracing::info!("Starting RSI monitor...");

    let mut cfg = AppConfig::load(cli.config.as_deref())?;
    if cli.dry_run {
        cfg.dry_run = true;
    }
    cfg.validate()?;

    let bybit = Arc::new(BybitClient::new(cfg.bybit_config())?);
    let notifier = build_notifier(&cfg)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let (stop_tx, stop_rx) = watch::channel(false);

    let state = MonitorState::new(AlertGate::new(cfg.gate_policy()), clock.now());
    let mut monitor = Monitor::new(
        bybit.clone(),
        bybit,
        notifier,
        clock,
        cfg.monitor_settings(),
        state,
        stop_rx,
    );

    if cli.once {
        return match monitor.run_cycle().await {
            CycleOutcome::Completed(summary) => {
                monitor.send_status(&summary).await?;
                Ok(())
            }
            CycleOutcome::FailedTotal(e) => Err(e.into()),
            CycleOutcome::Interrupted => Ok(()),
        };
    }

    let handle = tokio::spawn(async move {
        monitor.run().await;
    });

    supervise(handle, tokio::signal::ctrl_c(), stop_tx).await?;

    Ok(())
}

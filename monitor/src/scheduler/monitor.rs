//! Scan loop.
//!
//! One scan cycle:
//! 1) list the symbol universe once;
//! 2) per symbol: read the RSI, run the alert gate inline, keep the reading;
//! 3) classify the cycle's readings into report buckets;
//! 4) send the status report if it is due.
//!
//! Non-responsibilities:
//! - candle fetching and RSI math (`IndicatorSource`);
//! - message delivery (`Notifier`).
//!
//! Liveness:
//! - per-symbol failures skip the symbol, never the cycle;
//! - a failed universe fetch ends the cycle as `FailedTotal` and the driver
//!   retries after the normal scan interval;
//! - a stop signal is honoured between fetches and during every pause.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use common::logger::{TraceId, cycle_span, symbol_span, warn_if_slow};
use market::{IndicatorSource, MarketError, SymbolProvider, Timeframe};
use tokio::sync::watch;
use tracing::{Instrument, Span, debug, error, info, warn};

use crate::alert::{AlertGate, Decision};
use crate::classify::{Bucket, Reading, ReportBands, ScanSummary, classify};
use crate::clock::Clock;
use crate::error::AppError;
use crate::notifier::Notifier;
use crate::report;
use crate::stats::RunStats;

use super::cadence::status_due;

/// Progress is logged every this many symbols.
const PROGRESS_EVERY: usize = 50;

const SLOW_FETCH: Duration = Duration::from_secs(3);
const SLOW_SEND: Duration = Duration::from_secs(5);

#[derive(Clone, Debug)]
pub struct MonitorSettings {
    pub rsi_period: usize,
    pub timeframe: Timeframe,
    pub bands: ReportBands,
    pub status_interval: TimeDelta,
    pub scan_interval: Duration,
    pub per_symbol_delay: Duration,
    /// Only used in message text; the gate holds the actual cooldown.
    pub cooldown_hours: f64,
    pub quote_currency: String,
}

/// Everything the monitor remembers between cycles. Lost on restart.
#[derive(Debug)]
pub struct MonitorState {
    pub gate: AlertGate,
    pub stats: RunStats,
    pub last_status_at: DateTime<Utc>,
}

impl MonitorState {
    /// The first status report becomes due one interval after `started_at`.
    pub fn new(gate: AlertGate, started_at: DateTime<Utc>) -> Self {
        Self {
            gate,
            stats: RunStats::default(),
            last_status_at: started_at,
        }
    }
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(ScanSummary),
    /// The symbol universe could not be fetched; nothing was scanned.
    FailedTotal(AppError),
    /// Stop was requested mid-cycle; no classification or report happened.
    Interrupted,
}

pub struct Monitor {
    symbols: Arc<dyn SymbolProvider>,
    indicators: Arc<dyn IndicatorSource>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    settings: MonitorSettings,
    state: MonitorState,
    shutdown: watch::Receiver<bool>,
}

impl Monitor {
    pub fn new(
        symbols: Arc<dyn SymbolProvider>,
        indicators: Arc<dyn IndicatorSource>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        settings: MonitorSettings,
        state: MonitorState,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            symbols,
            indicators,
            notifier,
            clock,
            settings,
            state,
            shutdown,
        }
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    /// Drives cycles until a stop is requested. Never returns on errors.
    pub async fn run(&mut self) {
        info!(
            scan_every_s = self.settings.scan_interval.as_secs(),
            status_every_min = self.settings.status_interval.num_minutes(),
            per_symbol_delay_ms = self.settings.per_symbol_delay.as_millis() as u64,
            "monitor started"
        );

        self.announce_startup().await;

        loop {
            if self.stop_requested() {
                break;
            }

            match self.run_cycle().await {
                CycleOutcome::Completed(summary) => {
                    debug!(scan = summary.scan_number, "cycle completed");
                }
                CycleOutcome::FailedTotal(e) => {
                    warn!(error = %e, "cycle failed; retrying after the scan interval");
                }
                CycleOutcome::Interrupted => break,
            }

            debug!(
                wait_s = self.settings.scan_interval.as_secs(),
                "waiting for next scan"
            );
            if !self.pause(self.settings.scan_interval).await {
                break;
            }
        }

        info!(
            scans = self.state.stats.total_scans,
            alerts = self.state.stats.total_alerts_sent,
            "monitor stopped"
        );
    }

    /// Runs exactly one scan cycle.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        self.state.stats.record_scan();
        let scan = self.state.stats.total_scans;

        let span = cycle_span(scan, &TraceId::default());
        self.scan(scan).instrument(span).await
    }

    /// Sends the status report for `summary` now, regardless of cadence, and
    /// restarts the report interval. The interval restarts even when
    /// delivery fails.
    pub async fn send_status(&mut self, summary: &ScanSummary) -> Result<(), AppError> {
        let now = self.clock.now();
        let msg = report::status_message(
            summary,
            &self.state.stats,
            &self.settings,
            self.state.gate.policy().alert_threshold,
            now,
        );

        let sent = warn_if_slow("status_send", SLOW_SEND, self.notifier.send(&msg)).await;
        self.state.last_status_at = now;

        sent?;
        info!(scan = summary.scan_number, "status report sent");
        Ok(())
    }

    async fn scan(&mut self, scan: u64) -> CycleOutcome {
        info!("scan started");

        let symbols = match self.symbols.list_symbols().await {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "symbol universe fetch failed");
                return CycleOutcome::FailedTotal(e.into());
            }
        };

        if symbols.is_empty() {
            warn!("symbol universe is empty");
        }

        let total = symbols.len();
        let mut readings = Vec::with_capacity(total);
        let mut alerts_sent = 0u64;

        for (i, symbol) in symbols.iter().enumerate() {
            if self.stop_requested() {
                info!(done = i, total, "scan interrupted by shutdown");
                return CycleOutcome::Interrupted;
            }

            let span = symbol_span(symbol);
            if let Some(reading) = self.read_symbol(symbol).instrument(span.clone()).await {
                if self.dispatch_alert(&reading).instrument(span).await {
                    alerts_sent += 1;
                }
                readings.push(reading);
            }

            if (i + 1) % PROGRESS_EVERY == 0 {
                info!(done = i + 1, total, "scan progress");
            }

            if i + 1 < total && !self.pause(self.settings.per_symbol_delay).await {
                info!(done = i + 1, total, "scan interrupted by shutdown");
                return CycleOutcome::Interrupted;
            }
        }

        let mut summary = classify(scan, readings, &self.settings.bands);
        summary.universe_count = total;
        summary.alerts_sent = alerts_sent;

        Span::current().record("checked", summary.checked_count);
        let b = &summary.buckets;
        info!(
            checked = summary.checked_count,
            universe = total,
            very_high = b.get(Bucket::VeryHigh).len(),
            high = b.get(Bucket::High).len(),
            moderate = b.get(Bucket::Moderate).len(),
            low = b.get(Bucket::Low).len(),
            alerts_sent,
            "scan finished"
        );

        self.maybe_send_status(&summary).await;

        CycleOutcome::Completed(summary)
    }

    /// Fetches the symbol's RSI. Any failure skips the symbol.
    async fn read_symbol(&self, symbol: &str) -> Option<Reading> {
        let res = warn_if_slow(
            "indicator_fetch",
            SLOW_FETCH,
            self.indicators
                .rsi(symbol, self.settings.rsi_period, self.settings.timeframe),
        )
        .await;

        match res {
            Ok(Some(rsi)) if rsi.is_finite() && (0.0..=100.0).contains(&rsi) => {
                Span::current().record("rsi", rsi);
                Some(Reading {
                    symbol: symbol.to_string(),
                    rsi,
                    observed_at: self.clock.now(),
                })
            }
            Ok(Some(rsi)) => {
                warn!(rsi, "rsi outside [0, 100]; skipping");
                None
            }
            Ok(None) => {
                debug!("rsi unavailable; skipping");
                None
            }
            Err(MarketError::InsufficientHistory { have, need, .. }) => {
                debug!(have, need, "insufficient history; skipping");
                None
            }
            Err(e) => {
                warn!(error = %e, "indicator fetch failed; skipping");
                None
            }
        }
    }

    /// Runs the alert gate and delivers the alert if it passes. Returns true
    /// when an alert was delivered.
    async fn dispatch_alert(&mut self, reading: &Reading) -> bool {
        let policy = *self.state.gate.policy();
        let decision = self
            .state
            .gate
            .evaluate(&reading.symbol, reading.rsi, reading.observed_at);

        let Decision::Emit(level) = decision else {
            if reading.rsi >= policy.alert_threshold {
                info!(
                    symbol = %reading.symbol,
                    rsi = reading.rsi,
                    "alert suppressed; symbol in cooldown"
                );
            }
            return false;
        };

        let msg = report::alert_message(
            reading,
            level,
            self.settings.timeframe,
            self.settings.cooldown_hours,
            policy.alert_threshold,
        );

        match warn_if_slow("alert_send", SLOW_SEND, self.notifier.send(&msg)).await {
            Ok(()) => {
                self.state
                    .gate
                    .record(&reading.symbol, level, reading.observed_at);
                self.state.stats.record_alert(&reading.symbol, reading.rsi);
                info!(
                    symbol = %reading.symbol,
                    rsi = reading.rsi,
                    level = level.as_str(),
                    "alert sent"
                );
                true
            }
            Err(e) => {
                // History untouched: the next qualifying reading retries.
                error!(
                    error = %e,
                    symbol = %reading.symbol,
                    "alert delivery failed"
                );
                false
            }
        }
    }

    async fn maybe_send_status(&mut self, summary: &ScanSummary) {
        let now = self.clock.now();
        if !status_due(now, self.state.last_status_at, self.settings.status_interval) {
            debug!("status report not due");
            return;
        }

        if let Err(e) = self.send_status(summary).await {
            error!(error = %e, "status report delivery failed");
        }
    }

    async fn announce_startup(&self) {
        let msg = report::startup_message(&self.settings, self.state.gate.policy());
        if let Err(e) = self.notifier.send(&msg).await {
            warn!(error = %e, "startup message delivery failed");
        }
    }

    fn stop_requested(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Sleeps for `d` unless stop is requested first. Returns false on stop.
    async fn pause(&mut self, d: Duration) -> bool {
        if self.stop_requested() {
            return false;
        }
        if d.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(d) => true,
            _ = stop_signalled(&mut self.shutdown) => false,
        }
    }
}

/// Resolves once stop is requested. A dropped sender never resolves.
async fn stop_signalled(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

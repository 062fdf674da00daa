#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use tokio::sync::watch;

use market::{IndicatorSource, MarketError, SymbolProvider, Timeframe};
use monitor::{
    alert::{AlertGate, GatePolicy},
    classify::ReportBands,
    clock::ManualClock,
    notifier::{Notifier, NotifyError},
    scheduler::{Monitor, MonitorSettings, MonitorState},
};

/// What the mock indicator source answers for a symbol.
#[derive(Debug, Clone, Copy)]
pub enum MockRsi {
    Value(f64),
    Unavailable,
    InsufficientHistory,
    Fail,
}

#[derive(Default)]
struct MarketData {
    universe: Vec<String>,
    universe_down: bool,
    rsi: HashMap<String, MockRsi>,
    rsi_calls: Vec<String>,
}

#[derive(Default, Clone)]
pub struct MockMarket {
    inner: Arc<Mutex<MarketData>>,
}

impl MockMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Universe in the given order, each symbol answering with its value.
    pub fn with_readings(readings: &[(&str, f64)]) -> Self {
        let m = Self::new();
        m.set_readings(readings);
        m
    }

    pub fn set_readings(&self, readings: &[(&str, f64)]) {
        let mut d = self.inner.lock();
        d.universe = readings.iter().map(|(s, _)| s.to_string()).collect();
        d.rsi = readings
            .iter()
            .map(|(s, v)| (s.to_string(), MockRsi::Value(*v)))
            .collect();
    }

    pub fn push(&self, symbol: &str, rsi: MockRsi) {
        let mut d = self.inner.lock();
        d.universe.push(symbol.to_string());
        d.rsi.insert(symbol.to_string(), rsi);
    }

    pub fn set_universe_down(&self, down: bool) {
        self.inner.lock().universe_down = down;
    }

    pub fn rsi_calls(&self) -> Vec<String> {
        self.inner.lock().rsi_calls.clone()
    }
}

#[async_trait]
impl SymbolProvider for MockMarket {
    async fn list_symbols(&self) -> Result<Vec<String>, MarketError> {
        let d = self.inner.lock();
        if d.universe_down {
            return Err(MarketError::Api {
                code: 10006,
                message: "Too many visits!".into(),
            });
        }
        Ok(d.universe.clone())
    }
}

#[async_trait]
impl IndicatorSource for MockMarket {
    async fn rsi(
        &self,
        symbol: &str,
        period: usize,
        _timeframe: Timeframe,
    ) -> Result<Option<f64>, MarketError> {
        let mut d = self.inner.lock();
        d.rsi_calls.push(symbol.to_string());

        match d.rsi.get(symbol).copied() {
            Some(MockRsi::Value(v)) => Ok(Some(v)),
            Some(MockRsi::Unavailable) | None => Ok(None),
            Some(MockRsi::InsufficientHistory) => Err(MarketError::InsufficientHistory {
                symbol: symbol.to_string(),
                have: 3,
                need: period + 1,
            }),
            Some(MockRsi::Fail) => Err(MarketError::InvalidResponse("connection reset".into())),
        }
    }
}

/// Notifier that keeps every delivered message and can be told to fail.
#[derive(Default, Clone)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingNotifier {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    pub fn alerts(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.contains("ALERT*"))
            .collect()
    }

    pub fn status_reports(&self) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|m| m.contains("Periodic market update"))
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(NotifyError::Rejected("502: Bad Gateway".into()));
        }
        self.sent.lock().push(message.to_string());
        Ok(())
    }
}

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn test_settings() -> MonitorSettings {
    MonitorSettings {
        rsi_period: 14,
        timeframe: Timeframe::H4,
        bands: ReportBands::default(),
        status_interval: TimeDelta::minutes(30),
        scan_interval: Duration::from_secs(60),
        per_symbol_delay: Duration::ZERO,
        cooldown_hours: 4.0,
        quote_currency: "USDT".into(),
    }
}

pub struct Harness {
    pub monitor: Monitor,
    pub market: MockMarket,
    pub notifier: RecordingNotifier,
    pub clock: Arc<ManualClock>,
    pub stop: watch::Sender<bool>,
}

pub fn harness(market: MockMarket) -> Harness {
    harness_with(market, test_settings())
}

pub fn harness_with(market: MockMarket, settings: MonitorSettings) -> Harness {
    let notifier = RecordingNotifier::default();
    let clock = Arc::new(ManualClock::new(t0()));
    let (stop, stop_rx) = watch::channel(false);

    let state = MonitorState::new(AlertGate::new(GatePolicy::default()), t0());
    let monitor = Monitor::new(
        Arc::new(market.clone()),
        Arc::new(market.clone()),
        Arc::new(notifier.clone()),
        clock.clone(),
        settings,
        state,
        stop_rx,
    );

    Harness {
        monitor,
        market,
        notifier,
        clock,
        stop,
    }
}

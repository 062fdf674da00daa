use std::path::Path;
use std::time::Duration;

use chrono::TimeDelta;
use market::Timeframe;
use market::bybit::BybitConfig;
use serde::{Deserialize, Deserializer};

use crate::alert::GatePolicy;
use crate::classify::ReportBands;
use crate::error::AppError;
use crate::scheduler::MonitorSettings;

/// Config file picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

const MAX_COOLDOWN_HOURS: f64 = 24.0 * 365.0;
const MAX_STATUS_INTERVAL_MINUTES: u64 = 60 * 24 * 7;
const MAX_SCAN_INTERVAL_SECONDS: u64 = 60 * 60 * 24;
const MAX_PER_SYMBOL_DELAY_SECONDS: f64 = 60.0;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // =========================
    // Notification transport
    // =========================
    /// Telegram bot token. Required unless `dry_run` is set.
    pub telegram_bot_token: Option<String>,

    /// Recipient chat. Accepted as a string or a number in the file.
    #[serde(deserialize_with = "string_or_number")]
    pub telegram_chat_id: Option<String>,

    pub telegram_api_base: String,

    /// Log messages instead of sending them.
    pub dry_run: bool,

    // =========================
    // Market data
    // =========================
    pub bybit_base_url: String,

    /// Only perpetuals quoted in this currency are scanned.
    pub quote_currency: String,

    /// Candle interval the RSI is computed on.
    pub timeframe: Timeframe,

    /// Candles requested per symbol. Must exceed `rsi_period`.
    pub kline_limit: usize,

    pub http_timeout_seconds: u64,

    // =========================
    // Indicator and alerting
    // =========================
    pub rsi_period: usize,

    /// Immediate alerts fire only at or above this value.
    pub alert_threshold: f64,

    /// Alerts at or above this value are "very high" and may bypass the
    /// cooldown once after a "high" alert. Also the lower bound of the
    /// very-high report band.
    #[serde(alias = "rsi_very_high")]
    pub very_high_cutoff: f64,

    /// Minimum time between two alerts for the same symbol.
    #[serde(alias = "alert_cooldown_hours")]
    pub cooldown_hours: f64,

    // =========================
    // Periodic report
    // =========================
    /// Lower bound of the "high" report band.
    #[serde(alias = "rsi_high")]
    pub high_report_cutoff: f64,

    /// Lower bound of the "moderate" report band.
    pub moderate_report_cutoff: f64,

    /// Elapsed time after which the next completed scan sends a status report.
    pub status_interval_minutes: u64,

    // =========================
    // Pacing
    // =========================
    /// Pause between two scan cycles.
    #[serde(alias = "check_interval")]
    pub scan_interval_seconds: u64,

    /// Pause between two per-symbol fetches. Keeps the scan under the
    /// exchange's public rate limit.
    pub per_symbol_delay_seconds: f64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: None,
            telegram_chat_id: None,
            telegram_api_base: "https://api.telegram.org".to_string(),
            dry_run: false,

            bybit_base_url: "https://api.bybit.com".to_string(),
            quote_currency: "USDT".to_string(),
            timeframe: Timeframe::H4,
            kline_limit: 100,
            http_timeout_seconds: 10,

            rsi_period: 14,
            alert_threshold: 85.0,
            very_high_cutoff: 90.0,
            cooldown_hours: 4.0,

            high_report_cutoff: 70.0,
            moderate_report_cutoff: 50.0,
            status_interval_minutes: 30,

            scan_interval_seconds: 60,
            per_symbol_delay_seconds: 0.3,
        }
    }
}

impl AppConfig {
    /// Defaults, overlaid by the JSON file (explicit path, or `config.json`
    /// if present), overlaid by the environment.
    ///
    /// The result is not validated; call [`AppConfig::validate`] after any
    /// further overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, AppError> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Applies environment overrides using `get` as the variable lookup.
    pub fn apply_env<F>(&mut self, get: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = get("TELEGRAM_BOT_TOKEN") {
            self.telegram_bot_token = Some(v);
        }
        if let Some(v) = get("TELEGRAM_CHAT_ID") {
            self.telegram_chat_id = Some(v);
        }
        if let Some(v) = get("BYBIT_BASE_URL") {
            self.bybit_base_url = v;
        }
        if let Some(v) = get("RSI_DRY_RUN") {
            self.dry_run = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
    }

    /// Rejects settings the monitor cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        let fail = |msg: String| Err(AppError::Configuration(msg));

        if !self.dry_run {
            if self.telegram_bot_token.as_deref().is_none_or(str::is_empty) {
                return fail("telegram_bot_token is required (or enable dry_run)".into());
            }
            if self.telegram_chat_id.as_deref().is_none_or(str::is_empty) {
                return fail("telegram_chat_id is required (or enable dry_run)".into());
            }
        }

        for (name, v) in [
            ("alert_threshold", self.alert_threshold),
            ("very_high_cutoff", self.very_high_cutoff),
            ("high_report_cutoff", self.high_report_cutoff),
            ("moderate_report_cutoff", self.moderate_report_cutoff),
        ] {
            if !(0.0..=100.0).contains(&v) {
                return fail(format!("{name} must be within [0, 100], got {v}"));
            }
        }

        if self.alert_threshold > self.very_high_cutoff {
            return fail(format!(
                "alert_threshold ({}) must not exceed very_high_cutoff ({})",
                self.alert_threshold, self.very_high_cutoff
            ));
        }

        if !(self.moderate_report_cutoff < self.high_report_cutoff
            && self.high_report_cutoff <= self.very_high_cutoff)
        {
            return fail(format!(
                "report cutoffs must satisfy moderate < high <= very_high, got {} / {} / {}",
                self.moderate_report_cutoff, self.high_report_cutoff, self.very_high_cutoff
            ));
        }

        if self.rsi_period < 2 {
            return fail(format!("rsi_period must be at least 2, got {}", self.rsi_period));
        }
        if self.kline_limit <= self.rsi_period {
            return fail(format!(
                "kline_limit ({}) must exceed rsi_period ({})",
                self.kline_limit, self.rsi_period
            ));
        }

        if !(0.0..=MAX_COOLDOWN_HOURS).contains(&self.cooldown_hours) {
            return fail(format!(
                "cooldown_hours must be within [0, {MAX_COOLDOWN_HOURS}], got {}",
                self.cooldown_hours
            ));
        }
        if !(1..=MAX_STATUS_INTERVAL_MINUTES).contains(&self.status_interval_minutes) {
            return fail(format!(
                "status_interval_minutes must be within [1, {MAX_STATUS_INTERVAL_MINUTES}], got {}",
                self.status_interval_minutes
            ));
        }
        if !(1..=MAX_SCAN_INTERVAL_SECONDS).contains(&self.scan_interval_seconds) {
            return fail(format!(
                "scan_interval_seconds must be within [1, {MAX_SCAN_INTERVAL_SECONDS}], got {}",
                self.scan_interval_seconds
            ));
        }
        if self.http_timeout_seconds == 0 {
            return fail("http_timeout_seconds must be positive".into());
        }
        if !(0.0..=MAX_PER_SYMBOL_DELAY_SECONDS).contains(&self.per_symbol_delay_seconds) {
            return fail(format!(
                "per_symbol_delay_seconds must be within [0, {MAX_PER_SYMBOL_DELAY_SECONDS}], got {}",
                self.per_symbol_delay_seconds
            ));
        }
        if self.quote_currency.is_empty() {
            return fail("quote_currency must not be empty".into());
        }

        Ok(())
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn cooldown(&self) -> TimeDelta {
        TimeDelta::milliseconds((self.cooldown_hours * 3_600_000.0).round() as i64)
    }

    pub fn gate_policy(&self) -> GatePolicy {
        GatePolicy {
            alert_threshold: self.alert_threshold,
            very_high_cutoff: self.very_high_cutoff,
            cooldown: self.cooldown(),
        }
    }

    pub fn report_bands(&self) -> ReportBands {
        ReportBands {
            very_high: self.very_high_cutoff,
            high: self.high_report_cutoff,
            moderate: self.moderate_report_cutoff,
        }
    }

    pub fn bybit_config(&self) -> BybitConfig {
        BybitConfig {
            base_url: self.bybit_base_url.clone(),
            quote_currency: self.quote_currency.clone(),
            kline_limit: self.kline_limit,
            timeout: self.http_timeout(),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            rsi_period: self.rsi_period,
            timeframe: self.timeframe,
            bands: self.report_bands(),
            status_interval: TimeDelta::minutes(self.status_interval_minutes as i64),
            scan_interval: Duration::from_secs(self.scan_interval_seconds),
            per_symbol_delay: Duration::from_secs_f64(self.per_symbol_delay_seconds),
            cooldown_hours: self.cooldown_hours,
            quote_currency: self.quote_currency.clone(),
        }
    }
}

fn string_or_number<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(i64),
    }

    Ok(Option::<Raw>::deserialize(d)?.map(|r| match r {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    }))
}

//! Telegram-flavoured Markdown messages.

use std::fmt::Write;

use chrono::{DateTime, Utc};
use market::Timeframe;

use crate::alert::{AlertLevel, GatePolicy};
use crate::classify::{Reading, ScanSummary};
use crate::scheduler::MonitorSettings;
use crate::stats::RunStats;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Entries listed per hot band (very high, high) in the status report.
const TOP_HOT: usize = 5;
/// Entries listed for the moderate band.
const TOP_MODERATE: usize = 3;

const SEPARATOR: &str = "━━━━━━━━━━━━━━━━━━━━━";

pub fn alert_message(
    reading: &Reading,
    level: AlertLevel,
    timeframe: Timeframe,
    cooldown_hours: f64,
    alert_threshold: f64,
) -> String {
    let (banner, title, action) = match level {
        AlertLevel::VeryHigh => (
            "🚨🚨🚨",
            "VERY HIGH",
            "⚠️ RSI is extremely stretched - strong sell-side signal",
        ),
        _ => (
            "⚠️⚠️",
            "HIGH",
            "💡 RSI is elevated - watch this coin for a sell setup",
        ),
    };

    format!(
        "{banner} *RSI {title} ALERT* {banner}\n\
         \n\
         💎 *Symbol:* {symbol}\n\
         📊 *RSI:* {rsi:.2}\n\
         ⏰ *Time:* {time}\n\
         📈 *Timeframe:* {timeframe}\n\
         \n\
         {action}\n\
         \n\
         {SEPARATOR}\n\
         🔔 No further alert for this symbol for {cooldown_hours} h unless it escalates\n\
         📱 Alerts fire only at RSI ≥ {alert_threshold}",
        symbol = reading.symbol,
        rsi = reading.rsi,
        time = reading.observed_at.format(TIME_FORMAT),
    )
}

pub fn status_message(
    summary: &ScanSummary,
    stats: &RunStats,
    settings: &MonitorSettings,
    alert_threshold: f64,
    now: DateTime<Utc>,
) -> String {
    let b = &summary.buckets;
    let bands = &settings.bands;
    let total = b.total();
    let share = |n: usize| {
        if total == 0 {
            0.0
        } else {
            n as f64 / total as f64 * 100.0
        }
    };

    let last_symbol = stats.last_alert_symbol.as_deref().unwrap_or("none");
    let last_rsi = stats
        .last_alert_rsi
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "none".to_string());

    let mut out = String::new();
    let _ = writeln!(out, "📊 *Periodic market update*\n");
    let _ = writeln!(out, "⏰ *Time:* {}", now.format(TIME_FORMAT));
    let _ = writeln!(out, "🔍 *Scan:* #{}", summary.scan_number);
    let _ = writeln!(
        out,
        "✅ *Symbols checked:* {}/{}",
        summary.checked_count, summary.universe_count
    );
    let _ = writeln!(out, "\n{SEPARATOR}");

    let _ = writeln!(
        out,
        "🔴 *Very high RSI (≥{}):* {} ({:.1}%)",
        bands.very_high,
        b.very_high.len(),
        share(b.very_high.len())
    );
    write_top(&mut out, &b.very_high, TOP_HOT);

    let _ = writeln!(
        out,
        "\n🟡 *High RSI ({}-{}):* {} ({:.1}%)",
        bands.high,
        bands.very_high,
        b.high.len(),
        share(b.high.len())
    );
    write_top(&mut out, &b.high, TOP_HOT);

    let _ = writeln!(
        out,
        "\n🟠 *Moderate RSI ({}-{}):* {}",
        bands.moderate,
        bands.high,
        b.moderate.len()
    );
    write_top(&mut out, &b.moderate, TOP_MODERATE);

    let _ = writeln!(
        out,
        "\n🟢 *Low RSI (<{}):* {}",
        bands.moderate,
        b.low.len()
    );

    let _ = writeln!(out, "\n{SEPARATOR}");
    let _ = writeln!(out, "📈 *Totals:*");
    let _ = writeln!(out, "  • Alerts sent: {}", stats.total_alerts_sent);
    let _ = writeln!(out, "  • Scans: {}", stats.total_scans);
    let _ = writeln!(out, "\n🎯 *Last alert:*");
    let _ = writeln!(out, "  • Symbol: {last_symbol}");
    let _ = writeln!(out, "  • RSI: {last_rsi}");
    let _ = writeln!(out, "\n{SEPARATOR}");
    let _ = writeln!(out, "🔔 Immediate alerts only at RSI ≥ {alert_threshold}");
    let _ = write!(
        out,
        "📱 Next update in {} minutes",
        settings.status_interval.num_minutes()
    );

    out
}

pub fn startup_message(settings: &MonitorSettings, policy: &GatePolicy) -> String {
    format!(
        "🚀 *RSI monitor is running* 🚀\n\
         \n\
         ⚙️ *Settings:*\n\
         \u{20} • 📊 Scan every {scan}s\n\
         \u{20} • 🎯 Immediate alerts at RSI ≥ {threshold} (very high ≥ {very_high})\n\
         \u{20} • 📈 Status report every {status} minutes\n\
         \u{20} • ⏰ Cooldown: {cooldown} h per symbol\n\
         \u{20} • 💹 Universe: all {quote} perpetuals, RSI({period}) on {timeframe}\n\
         \n\
         {SEPARATOR}\n\
         🔍 Scanning the market now...",
        scan = settings.scan_interval.as_secs(),
        threshold = policy.alert_threshold,
        very_high = policy.very_high_cutoff,
        status = settings.status_interval.num_minutes(),
        cooldown = settings.cooldown_hours,
        quote = settings.quote_currency,
        period = settings.rsi_period,
        timeframe = settings.timeframe,
    )
}

fn write_top(out: &mut String, readings: &[Reading], n: usize) {
    if readings.is_empty() {
        let _ = writeln!(out, "  • none");
        return;
    }

    for r in readings.iter().take(n) {
        let _ = writeln!(out, "  • {}: {:.2}", r.symbol, r.rsi);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::{ReportBands, classify};
    use chrono::TimeDelta;
    use std::time::Duration;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn r(symbol: &str, rsi: f64) -> Reading {
        Reading {
            symbol: symbol.into(),
            rsi,
            observed_at: t0(),
        }
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            rsi_period: 14,
            timeframe: Timeframe::H4,
            bands: ReportBands::default(),
            status_interval: TimeDelta::minutes(30),
            scan_interval: Duration::from_secs(60),
            per_symbol_delay: Duration::from_millis(300),
            cooldown_hours: 4.0,
            quote_currency: "USDT".into(),
        }
    }

    #[test]
    fn alert_message_carries_symbol_value_and_level() {
        let msg = alert_message(&r("AAAUSDT", 92.347), AlertLevel::VeryHigh, Timeframe::H4, 4.0, 85.0);

        assert!(msg.contains("VERY HIGH"));
        assert!(msg.contains("AAAUSDT"));
        assert!(msg.contains("92.35"));
        assert!(msg.contains("4h"));
        assert!(msg.contains("2023-11-14 22:13:20 UTC"));
    }

    #[test]
    fn high_alert_uses_high_banner() {
        let msg = alert_message(&r("BBBUSDT", 86.0), AlertLevel::High, Timeframe::H1, 4.0, 85.0);
        assert!(msg.contains("*RSI HIGH ALERT*"));
        assert!(!msg.contains("VERY HIGH"));
    }

    #[test]
    fn status_lists_top_entries_and_shares() {
        let readings = vec![
            r("V1", 99.0),
            r("V2", 98.0),
            r("V3", 97.0),
            r("V4", 96.0),
            r("V5", 95.0),
            r("V6", 94.0),
            r("M1", 55.0),
            r("L1", 10.0),
        ];
        let mut summary = classify(12, readings, &ReportBands::default());
        summary.universe_count = 10;

        let stats = RunStats {
            total_scans: 12,
            total_alerts_sent: 3,
            last_alert_symbol: Some("V1".into()),
            last_alert_rsi: Some(99.0),
        };

        let msg = status_message(&summary, &stats, &settings(), 85.0, t0());

        assert!(msg.contains("#12"));
        assert!(msg.contains("8/10"));
        assert!(msg.contains("75.0%"));
        assert!(msg.contains("V5: 95.00"));
        assert!(!msg.contains("V6: 94.00"));
        assert!(msg.contains("M1: 55.00"));
        assert!(msg.contains("Alerts sent: 3"));
        assert!(msg.contains("Symbol: V1"));
        assert!(msg.contains("Next update in 30 minutes"));
    }

    #[test]
    fn status_without_data_or_alerts_says_none() {
        let summary = classify(1, Vec::new(), &ReportBands::default());
        let msg = status_message(&summary, &RunStats::default(), &settings(), 85.0, t0());

        assert!(msg.contains("0/0"));
        assert!(msg.contains("0.0%"));
        assert!(msg.contains("Symbol: none"));
        assert!(msg.contains("RSI: none"));
    }

    #[test]
    fn startup_summarises_settings() {
        let msg = startup_message(&settings(), &GatePolicy::default());
        assert!(msg.contains("Scan every 60s"));
        assert!(msg.contains("RSI ≥ 85"));
        assert!(msg.contains("every 30 minutes"));
        assert!(msg.contains("USDT perpetuals"));
    }
}

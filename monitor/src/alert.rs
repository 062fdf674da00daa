//! Per-symbol alert gate.
//!
//! Decides whether a qualifying RSI reading turns into a notification now:
//! - readings below `alert_threshold` never alert;
//! - a symbol alerts at most once per cooldown window;
//! - a High -> VeryHigh escalation inside the window alerts exactly once.
//!
//! History is written through [`AlertGate::record`] only after the
//! notification was delivered, so a failed send leaves the symbol eligible on
//! the next scan. The guarantee is at-most-once-attempted per window.

use std::collections::HashMap;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertLevel {
    #[default]
    None,
    High,
    VeryHigh,
}

impl AlertLevel {
    /// `None` below `high`, `VeryHigh` at or above `very_high`, `High` between.
    pub fn from_rsi(rsi: f64, high: f64, very_high: f64) -> Self {
        if rsi >= very_high {
            AlertLevel::VeryHigh
        } else if rsi >= high {
            AlertLevel::High
        } else {
            AlertLevel::None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::None => "none",
            AlertLevel::High => "high",
            AlertLevel::VeryHigh => "very_high",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertHistory {
    pub last_alert_time: Option<DateTime<Utc>>,
    pub last_alert_level: AlertLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Suppressed,
    Emit(AlertLevel),
}

#[derive(Debug, Clone, Copy)]
pub struct GatePolicy {
    /// Readings below this value never alert.
    pub alert_threshold: f64,
    /// Readings at or above this value alert as `VeryHigh`.
    pub very_high_cutoff: f64,
    /// Minimum spacing between two alerts for the same symbol.
    pub cooldown: TimeDelta,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            alert_threshold: 85.0,
            very_high_cutoff: 90.0,
            cooldown: TimeDelta::hours(4),
        }
    }
}

#[derive(Debug, Default)]
pub struct AlertGate {
    policy: GatePolicy,
    history: HashMap<String, AlertHistory>,
}

impl AlertGate {
    pub fn new(policy: GatePolicy) -> Self {
        Self {
            policy,
            history: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    /// Pure decision over the reading and the symbol's history.
    pub fn evaluate(&self, symbol: &str, rsi: f64, now: DateTime<Utc>) -> Decision {
        if rsi < self.policy.alert_threshold {
            return Decision::Suppressed;
        }

        let level = AlertLevel::from_rsi(
            rsi,
            self.policy.alert_threshold,
            self.policy.very_high_cutoff,
        );

        let Some(prev) = self.history.get(symbol) else {
            return Decision::Emit(level);
        };

        let in_cooldown = prev
            .last_alert_time
            .is_some_and(|t| now - t < self.policy.cooldown);

        if !in_cooldown {
            return Decision::Emit(level);
        }

        // Escalation bypasses the window once; repeats and de-escalations do not.
        if level == AlertLevel::VeryHigh && prev.last_alert_level != AlertLevel::VeryHigh {
            debug!(symbol, "escalation to very high bypasses cooldown");
            return Decision::Emit(level);
        }

        Decision::Suppressed
    }

    /// Stores a delivered alert. Overwrites any previous entry for `symbol`.
    pub fn record(&mut self, symbol: &str, level: AlertLevel, now: DateTime<Utc>) {
        self.history.insert(
            symbol.to_string(),
            AlertHistory {
                last_alert_time: Some(now),
                last_alert_level: level,
            },
        );
    }

    pub fn history(&self, symbol: &str) -> Option<&AlertHistory> {
        self.history.get(symbol)
    }

    /// Number of symbols that have alerted at least once.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn gate() -> AlertGate {
        AlertGate::new(GatePolicy::default())
    }

    #[test]
    fn level_bands() {
        assert_eq!(AlertLevel::from_rsi(84.99, 85.0, 90.0), AlertLevel::None);
        assert_eq!(AlertLevel::from_rsi(85.0, 85.0, 90.0), AlertLevel::High);
        assert_eq!(AlertLevel::from_rsi(89.99, 85.0, 90.0), AlertLevel::High);
        assert_eq!(AlertLevel::from_rsi(90.0, 85.0, 90.0), AlertLevel::VeryHigh);
    }

    #[test]
    fn below_threshold_is_suppressed_even_without_history() {
        let g = gate();
        assert_eq!(g.evaluate("AAAUSDT", 84.9, t0()), Decision::Suppressed);
        assert_eq!(g.evaluate("AAAUSDT", 0.0, t0()), Decision::Suppressed);
    }

    #[test]
    fn first_alert_emits_with_derived_level() {
        let g = gate();
        assert_eq!(
            g.evaluate("AAAUSDT", 86.0, t0()),
            Decision::Emit(AlertLevel::High)
        );
        assert_eq!(
            g.evaluate("AAAUSDT", 92.0, t0()),
            Decision::Emit(AlertLevel::VeryHigh)
        );
    }

    #[test]
    fn evaluate_does_not_mutate_history() {
        let g = gate();
        let _ = g.evaluate("AAAUSDT", 95.0, t0());
        assert!(g.is_empty());
    }

    #[test]
    fn same_level_repeat_within_cooldown_is_suppressed() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::High, t0());

        let later = t0() + TimeDelta::hours(3) + TimeDelta::minutes(59);
        assert_eq!(g.evaluate("AAAUSDT", 87.0, later), Decision::Suppressed);
    }

    #[test]
    fn cooldown_expires_at_exact_boundary() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::High, t0());

        let later = t0() + TimeDelta::hours(4);
        assert_eq!(
            g.evaluate("AAAUSDT", 87.0, later),
            Decision::Emit(AlertLevel::High)
        );
    }

    #[test]
    fn escalation_bypasses_cooldown_exactly_once() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::High, t0());

        let t1 = t0() + TimeDelta::minutes(1);
        let d = g.evaluate("AAAUSDT", 91.0, t1);
        assert_eq!(d, Decision::Emit(AlertLevel::VeryHigh));
        g.record("AAAUSDT", AlertLevel::VeryHigh, t1);

        let t2 = t0() + TimeDelta::minutes(2);
        assert_eq!(g.evaluate("AAAUSDT", 93.0, t2), Decision::Suppressed);
    }

    #[test]
    fn de_escalation_within_cooldown_is_suppressed() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::VeryHigh, t0());

        let t1 = t0() + TimeDelta::minutes(10);
        assert_eq!(g.evaluate("AAAUSDT", 86.0, t1), Decision::Suppressed);
    }

    #[test]
    fn histories_are_independent_per_symbol() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::VeryHigh, t0());

        assert_eq!(
            g.evaluate("BBBUSDT", 95.0, t0()),
            Decision::Emit(AlertLevel::VeryHigh)
        );
    }

    #[test]
    fn record_keeps_one_entry_per_symbol() {
        let mut g = gate();
        g.record("AAAUSDT", AlertLevel::High, t0());
        g.record("AAAUSDT", AlertLevel::VeryHigh, t0() + TimeDelta::hours(5));

        assert_eq!(g.len(), 1);
        let h = g.history("AAAUSDT").unwrap();
        assert_eq!(h.last_alert_level, AlertLevel::VeryHigh);
        assert_eq!(h.last_alert_time, Some(t0() + TimeDelta::hours(5)));
    }

    #[test]
    fn custom_policy_is_respected() {
        let mut g = AlertGate::new(GatePolicy {
            alert_threshold: 75.0,
            very_high_cutoff: 80.0,
            cooldown: TimeDelta::minutes(30),
        });

        assert_eq!(
            g.evaluate("AAAUSDT", 76.0, t0()),
            Decision::Emit(AlertLevel::High)
        );
        g.record("AAAUSDT", AlertLevel::High, t0());
        assert_eq!(
            g.evaluate("AAAUSDT", 76.0, t0() + TimeDelta::minutes(31)),
            Decision::Emit(AlertLevel::High)
        );
    }
}

use chrono::{DateTime, TimeDelta, Utc};

/// True once at least `interval` has elapsed since the last status report.
///
/// Checked at the end of every scan cycle, so reports always line up with
/// cycle boundaries.
pub fn status_due(now: DateTime<Utc>, last_status_at: DateTime<Utc>, interval: TimeDelta) -> bool {
    now - last_status_at >= interval
}

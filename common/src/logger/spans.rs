use std::future::Future;
use std::time::{Duration, Instant};

use tracing::{Span, field};

use super::TraceId;

/// Root span for one scan cycle. `checked` is recorded once the cycle ends.
pub fn cycle_span(scan_number: u64, trace_id: &TraceId) -> Span {
    tracing::info_span!(
        "scan_cycle",
        scan = scan_number,
        trace_id = %trace_id.as_str(),
        checked = field::Empty
    )
}

/// Child span for the work done on a single symbol.
pub fn symbol_span(symbol: &str) -> Span {
    tracing::debug_span!("symbol", symbol = %symbol, rsi = field::Empty)
}

/// Awaits `fut` and emits a warning on the `performance` target when it took
/// longer than `max`.
pub async fn warn_if_slow<F, T>(label: &'static str, max: Duration, fut: F) -> T
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let out = fut.await;
    let elapsed = start.elapsed();
    if elapsed > max {
        tracing::warn!(
            target: "performance",
            label = label,
            elapsed_ms = elapsed.as_millis() as u64,
            "slow operation detected"
        );
    }
    out
}

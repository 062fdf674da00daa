//! Latest-value RSI over a close series, Wilder smoothing.

use crate::errors::MarketError;

/// Feeds `closes` (oldest first) through an RSI of `period` and returns the
/// final value.
///
/// Average gain and loss are seeded with the simple mean of the first
/// `period` changes, then smoothed as `avg = (avg * (period - 1) + x) / period`.
///
/// At least `period + 1` closes are required. A series with neither gains nor
/// losses has no defined RSI and yields `None`, as does any result that is
/// not finite.
pub fn latest_rsi(symbol: &str, closes: &[f64], period: usize) -> Result<Option<f64>, MarketError> {
    if period == 0 {
        return Err(MarketError::Indicator("rsi period must be positive".into()));
    }

    let need = period + 1;
    if closes.len() < need {
        return Err(MarketError::InsufficientHistory {
            symbol: symbol.to_string(),
            have: closes.len(),
            need,
        });
    }

    let n = period as f64;
    let mut changes = closes.windows(2).map(|w| w[1] - w[0]);

    let (mut avg_gain, mut avg_loss) = changes
        .by_ref()
        .take(period)
        .fold((0.0, 0.0), |(g, l), c| (g + c.max(0.0), l + (-c).max(0.0)));
    avg_gain /= n;
    avg_loss /= n;

    for c in changes {
        avg_gain = (avg_gain * (n - 1.0) + c.max(0.0)) / n;
        avg_loss = (avg_loss * (n - 1.0) + (-c).max(0.0)) / n;
    }

    Ok(rsi_from_averages(avg_gain, avg_loss))
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let total = avg_gain + avg_loss;
    if total == 0.0 {
        return None;
    }

    let v = 100.0 * avg_gain / total;
    (v.is_finite() && (0.0..=100.0).contains(&v)).then_some(v)
}

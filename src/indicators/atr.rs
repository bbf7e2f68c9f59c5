// =============================================================================
// Average True Range (ATR) — simple-average variant
// =============================================================================
//
// ATR measures market volatility by decomposing the entire range of a bar.
//
// True Range (TR) for each bar:
//   TR = max(H - L, |H - prevClose|, |L - prevClose|)
//
// The first bar has no previous close, so its TR is undefined. ATR is the
// trailing simple mean of TR over `period` bars, which makes the first
// defined ATR land on index `period`.
//
// Default period: 14
// =============================================================================

use crate::indicators::rolling::rolling_mean;
use crate::market_data::{defined, Column};

/// True Range per bar, aligned with the input.
pub fn true_range(highs: &[Option<f64>], lows: &[Option<f64>], closes: &[Option<f64>]) -> Column {
    (0..highs.len())
        .map(|i| {
            let prev_close = closes.get(i.checked_sub(1)?).copied().flatten()?;
            let high = highs[i]?;
            let low = lows.get(i).copied().flatten()?;

            let hl = high - low;
            let hc = (high - prev_close).abs();
            let lc = (low - prev_close).abs();

            defined(hl.max(hc).max(lc))
        })
        .collect()
}

/// Trailing `period`-bar mean of the True Range series.
pub fn calculate_atr(true_range: &[Option<f64>], period: usize) -> Column {
    rolling_mean(true_range, period)
}

// =============================================================================
// Relative Strength Index (RSI) — simple-average variant
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes to evaluate
// whether an asset is overbought or oversold.
//
// Step 1 — Day-over-day deltas. A bar without a computable delta (the first
//          bar, or either close missing) contributes zero gain and zero loss.
// Step 2 — gain = max(delta, 0), loss = max(-delta, 0).
// Step 3 — avg_gain / avg_loss = trailing `period`-point simple means.
// Step 4 — RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// Thresholds:  RSI > 70 => overbought (SELL vote),  RSI < 30 => oversold (BUY).
// =============================================================================

use crate::indicators::rolling::rolling_mean;
use crate::market_data::Column;

/// Compute the RSI series for `closes` with the given `period`.
///
/// The output is aligned with the input; the first `period - 1` entries are
/// `None`.
///
/// # Edge cases
/// - `period == 0` => every entry `None`
/// - Average loss of zero with positive average gain => 100.0
/// - Neither gains nor losses in the window => `None` (0 / 0 is undefined)
pub fn calculate_rsi(closes: &[Option<f64>], period: usize) -> Column {
    if period == 0 {
        return vec![None; closes.len()];
    }

    // --- Gains and losses per bar --------------------------------------------
    let (gains, losses): (Column, Column) = (0..closes.len())
        .map(|i| {
            let delta = match (i.checked_sub(1).and_then(|p| closes[p]), closes[i]) {
                (Some(prev), Some(curr)) => curr - prev,
                _ => 0.0,
            };
            (Some(delta.max(0.0)), Some((-delta).max(0.0)))
        })
        .unzip();

    // --- Trailing simple averages --------------------------------------------
    let avg_gains = rolling_mean(&gains, period);
    let avg_losses = rolling_mean(&losses, period);

    avg_gains
        .iter()
        .zip(avg_losses.iter())
        .map(|(g, l)| rsi_from_averages((*g)?, (*l)?))
        .collect()
}

// =============================================================================
// Internal helpers
// =============================================================================

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If both averages are zero, RSI is undefined.
/// - If average loss is zero (only gains), RSI is 100.0.
/// - Returns `None` when the result is non-finite.
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        return None;
    }

    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}

// =============================================================================
// Rolling Window Statistics
// =============================================================================
//
// Causal trailing-window aggregates over aligned series. Output index `i`
// covers inputs `i + 1 - window ..= i`; it is `None` until the window fills
// and whenever any value inside the window is missing.
// =============================================================================

use crate::market_data::{defined, Column};

/// Slice of the full trailing window ending at `index`, if every value in it is
/// present.
fn full_window(values: &[Option<f64>], index: usize, window: usize) -> Option<Vec<f64>> {
    if window == 0 || index + 1 < window {
        return None;
    }
    values[index + 1 - window..=index].iter().copied().collect()
}

/// Simple moving average over `window` points.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Column {
    (0..values.len())
        .map(|i| {
            let w = full_window(values, i, window)?;
            defined(w.iter().sum::<f64>() / window as f64)
        })
        .collect()
}

/// Sample standard deviation (n - 1 denominator) over `window` points.
///
/// A one-point window has no sample deviation and yields `None`.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Column {
    (0..values.len())
        .map(|i| {
            if window < 2 {
                return None;
            }
            let w = full_window(values, i, window)?;
            let mean = w.iter().sum::<f64>() / window as f64;
            let variance = w.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (window - 1) as f64;
            defined(variance.sqrt())
        })
        .collect()
}

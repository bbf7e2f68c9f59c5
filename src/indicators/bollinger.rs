// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA), an upper band (SMA + k*σ),
// and a lower band (SMA - k*σ), where σ is the trailing *sample* standard
// deviation of the close.

use crate::indicators::rolling::{rolling_mean, rolling_std};
use crate::market_data::{defined, Column};

/// Aligned Bollinger band series.
#[derive(Debug, Clone)]
pub struct BollingerBands {
    pub middle: Column,
    pub std_dev: Column,
    pub upper: Column,
    pub lower: Column,
}

/// Calculate Bollinger Bands for the given closing prices.
///
/// - `upper`  = SMA + `num_std` * σ
/// - `middle` = SMA
/// - `lower`  = SMA - `num_std` * σ
///
/// Every series is `None` until `period` closes are available.
pub fn calculate_bollinger(closes: &[Option<f64>], period: usize, num_std: f64) -> BollingerBands {
    let middle = rolling_mean(closes, period);
    let std_dev = rolling_std(closes, period);

    let band = |sign: f64| -> Column {
        middle
            .iter()
            .zip(std_dev.iter())
            .map(|(m, s)| defined((*m)? + sign * num_std * (*s)?))
            .collect()
    };
    let upper = band(1.0);
    let lower = band(-1.0);

    BollingerBands {
        middle,
        std_dev,
        upper,
        lower,
    }
}

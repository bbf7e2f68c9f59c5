// =============================================================================
// MACD — Moving Average Convergence / Divergence
// =============================================================================
//
//   MACD      = EMA(fast) - EMA(slow)
//   Signal    = EMA(signal) of MACD
//   Histogram = MACD - Signal
//
// Standard spans: 12 / 26 / 9. All three EMAs use the same first-value seeded
// recurrence as `ema::calculate_ema`.
// =============================================================================

use crate::indicators::ema::calculate_ema;
use crate::market_data::{defined, Column};

/// Aligned MACD line, signal line and histogram.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Column,
    pub signal: Column,
    pub histogram: Column,
}

/// Compute MACD with explicit spans.
pub fn calculate_macd(closes: &[Option<f64>], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = calculate_ema(closes, fast);
    let slow_ema = calculate_ema(closes, slow);

    let macd: Column = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| defined((*f)? - (*s)?))
        .collect();

    let signal_line = calculate_ema(&macd, signal);

    let histogram = macd
        .iter()
        .zip(signal_line.iter())
        .map(|(m, s)| defined((*m)? - (*s)?))
        .collect();

    MacdSeries {
        macd,
        signal: signal_line,
        histogram,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn macd_of_constant_series_is_zero() {
        let closes = vec![Some(50.0); 40];
        let m = calculate_macd(&closes, 12, 26, 9);
        for i in 0..40 {
            assert!(m.macd[i].unwrap().abs() < 1e-12);
            assert!(m.signal[i].unwrap().abs() < 1e-12);
            assert!(m.histogram[i].unwrap().abs() < 1e-12);
        }
    }

    #[test]
    fn macd_is_aligned_and_defined_from_first_bar() {
        let closes: Column = (1..=40).map(|x| Some(x as f64)).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        assert_eq!(m.macd.len(), 40);
        assert_eq!(m.signal.len(), 40);
        assert_eq!(m.histogram.len(), 40);
        assert_eq!(m.macd[0], Some(0.0));
        assert!(m.macd[39].unwrap() > 0.0, "uptrend should give positive MACD");
    }

    #[test]
    fn histogram_is_macd_minus_signal() {
        let closes: Column = (0..40).map(|x| Some(100.0 + (x as f64 * 0.7).sin() * 5.0)).collect();
        let m = calculate_macd(&closes, 12, 26, 9);
        for i in 0..40 {
            let expected = m.macd[i].unwrap() - m.signal[i].unwrap();
            assert!((m.histogram[i].unwrap() - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn missing_leading_close_leaves_leading_gap() {
        let mut closes: Column = (1..=40).map(|x| Some(x as f64)).collect();
        closes[0] = None;
        let m = calculate_macd(&closes, 12, 26, 9);
        assert_eq!(m.macd[0], None);
        assert_eq!(m.histogram[0], None);
        assert!(m.macd[1].is_some());
    }
}

// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   alpha = 2 / (span + 1)
//   EMA_t = alpha * value_t + (1 - alpha) * EMA_{t-1}
//
// The recurrence is seeded with the first defined value itself (no SMA
// warm-up), so the output is defined from the first present input onwards.
// =============================================================================

use crate::market_data::Column;

/// Compute the EMA series for `values` with the given `span`.
///
/// The output is aligned with the input.
///
/// # Edge cases
/// - `span == 0` => every entry `None`
/// - Leading missing values => `None` until the first present value
/// - A missing value inside the series carries the previous EMA forward
///   unchanged; the recurrence resumes with the next present value.
pub fn calculate_ema(values: &[Option<f64>], span: usize) -> Column {
    if span == 0 {
        return vec![None; values.len()];
    }

    let alpha = 2.0 / (span as f64 + 1.0);
    let mut prev: Option<f64> = None;

    values
        .iter()
        .map(|value| {
            prev = match (*value, prev) {
                (Some(v), None) => Some(v),
                (Some(v), Some(p)) => {
                    let ema = alpha * v + (1.0 - alpha) * p;
                    // A broken recurrence would poison every later bar.
                    if ema.is_finite() {
                        Some(ema)
                    } else {
                        Some(p)
                    }
                }
                (None, p) => p,
            };
            prev
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    /// Helper: build a simple ascending price series.
    fn ascending(n: usize) -> Column {
        (1..=n).map(|i| Some(i as f64)).collect()
    }

    #[test]
    fn ema_empty_input() {
        assert!(calculate_ema(&[], 5).is_empty());
    }

    #[test]
    fn ema_span_zero() {
        assert_eq!(calculate_ema(&[Some(1.0), Some(2.0)], 0), vec![None, None]);
    }

    #[test]
    fn ema_seeded_with_first_value() {
        let ema = calculate_ema(&[Some(10.0), Some(20.0)], 3);
        // alpha = 0.5 => 0.5 * 20 + 0.5 * 10 = 15
        assert_eq!(ema[0], Some(10.0));
        assert!((ema[1].unwrap() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn ema_known_values() {
        let closes = ascending(10);
        let ema = calculate_ema(&closes, 5);
        assert_eq!(ema.len(), 10);

        let alpha = 2.0 / 6.0;
        let mut expected = 1.0;
        assert_eq!(ema[0], Some(expected));
        for (i, close) in closes.iter().enumerate().skip(1) {
            expected = alpha * close.unwrap() + (1.0 - alpha) * expected;
            let got = ema[i].unwrap();
            assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
        }
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let closes = vec![Some(42.0); 30];
        for span in [9, 21] {
            let ema = calculate_ema(&closes, span);
            assert!(ema.iter().all(|v| (v.unwrap() - 42.0).abs() < 1e-9));
        }
    }

    #[test]
    fn ema_leading_missing_values() {
        let ema = calculate_ema(&[None, None, Some(3.0), Some(5.0)], 3);
        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert_eq!(ema[2], Some(3.0));
        assert_eq!(ema[3], Some(4.0));
    }

    #[test]
    fn ema_gap_carries_forward() {
        let ema = calculate_ema(&[Some(2.0), None, Some(4.0)], 3);
        assert_eq!(ema[1], Some(2.0));
        assert_eq!(ema[2], Some(3.0));
    }

    #[test]
    fn fast_ema_leads_on_uptrend() {
        let closes = ascending(60);
        let fast = calculate_ema(&closes, 9);
        let slow = calculate_ema(&closes, 21);
        for i in 1..60 {
            assert!(fast[i].unwrap() > slow[i].unwrap(), "index {i}");
        }
    }
}

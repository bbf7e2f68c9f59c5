// =============================================================================
// Indicator Engine — enrich a normalised frame with derived series
// =============================================================================
//
// Consumes the normalised frame and returns a new frame carrying every
// indicator column. All computations are causal: index i only reads bars at
// or before i.
// =============================================================================

use tracing::debug;

use crate::errors::AnalysisError;
use crate::indicators::atr::{calculate_atr, true_range};
use crate::indicators::bollinger::calculate_bollinger;
use crate::indicators::columns::*;
use crate::indicators::ema::calculate_ema;
use crate::indicators::macd::calculate_macd;
use crate::indicators::rolling::rolling_mean;
use crate::indicators::rsi::calculate_rsi;
use crate::market_data::TimeSeriesFrame;

/// Minimum number of bars required to compute indicators.
pub const MIN_INDICATOR_ROWS: usize = 20;

/// Compute SMA, EMA, RSI, MACD, Bollinger and ATR columns.
pub fn compute_indicators(frame: TimeSeriesFrame) -> Result<TimeSeriesFrame, AnalysisError> {
    if frame.len() < MIN_INDICATOR_ROWS {
        return Err(AnalysisError::InsufficientHistory {
            stage: "calculate indicators",
            required: MIN_INDICATOR_ROWS,
            actual: frame.len(),
        });
    }

    let closes = frame.closes();
    let highs = frame.highs();
    let lows = frame.lows();

    let macd = calculate_macd(&closes, 12, 26, 9);
    let bands = calculate_bollinger(&closes, 20, 2.0);
    let tr = true_range(&highs, &lows, &closes);
    let atr = calculate_atr(&tr, 14);

    let frame = frame
        .with_column(SMA_20, rolling_mean(&closes, 20))?
        .with_column(SMA_50, rolling_mean(&closes, 50))?
        .with_column(EMA_9, calculate_ema(&closes, 9))?
        .with_column(EMA_21, calculate_ema(&closes, 21))?
        .with_column(RSI, calculate_rsi(&closes, 14))?
        .with_column(MACD, macd.macd)?
        .with_column(SIGNAL_LINE, macd.signal)?
        .with_column(MACD_HISTOGRAM, macd.histogram)?
        .with_column(BB_MIDDLE, bands.middle)?
        .with_column(BB_STD, bands.std_dev)?
        .with_column(BB_UPPER, bands.upper)?
        .with_column(BB_LOWER, bands.lower)?
        .with_column(TR, tr)?
        .with_column(ATR, atr)?;

    debug!(
        symbol = frame.symbol(),
        rows = frame.len(),
        columns = frame.column_names().count(),
        "indicators computed"
    );

    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn frame_from_closes(closes: &[f64]) -> TimeSeriesFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + Duration::days(i as i64),
                open: Some(c),
                high: Some(c + 1.0),
                low: Some(c - 1.0),
                close: Some(c),
                volume: Some(1_000.0),
            })
            .collect();
        TimeSeriesFrame::new("TEST", points)
    }

    #[test]
    fn fewer_than_twenty_rows_is_insufficient() {
        let err = compute_indicators(frame_from_closes(&[1.0; 19])).unwrap_err();
        assert_eq!(err.kind(), "InsufficientHistoryError");
        assert_eq!(
            err,
            AnalysisError::InsufficientHistory {
                stage: "calculate indicators",
                required: MIN_INDICATOR_ROWS,
                actual: 19,
            }
        );
    }

    #[test]
    fn every_column_is_aligned() {
        let frame = compute_indicators(frame_from_closes(&[10.0; 25])).unwrap();
        for name in [
            SMA_20, SMA_50, EMA_9, EMA_21, RSI, MACD, SIGNAL_LINE, MACD_HISTOGRAM, BB_MIDDLE,
            BB_STD, BB_UPPER, BB_LOWER, TR, ATR,
        ] {
            assert_eq!(frame.column(name).unwrap().len(), 25, "{name}");
        }
    }

    #[test]
    fn sma_warm_up_boundaries() {
        let closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        let frame = compute_indicators(frame_from_closes(&closes)).unwrap();
        let sma20 = frame.column(SMA_20).unwrap();
        let sma50 = frame.column(SMA_50).unwrap();
        for i in 0..60 {
            assert_eq!(sma20[i].is_some(), i >= 19, "SMA_20 at {i}");
            assert_eq!(sma50[i].is_some(), i >= 49, "SMA_50 at {i}");
        }
        assert!(sma20.iter().flatten().all(|v| v.is_finite()));
    }

    #[test]
    fn constant_series_emas_converge() {
        let frame = compute_indicators(frame_from_closes(&[25.0; 30])).unwrap();
        for name in [EMA_9, EMA_21] {
            let last = frame.value(name, 29).unwrap();
            assert!((last - 25.0).abs() < 1e-9, "{name} = {last}");
        }
    }

    #[test]
    fn rsi_stays_in_range() {
        let closes: Vec<f64> = (0..80)
            .map(|i| 100.0 + (i as f64 * 0.37).sin() * 8.0 + (i as f64 * 1.3).cos() * 3.0)
            .collect();
        let frame = compute_indicators(frame_from_closes(&closes)).unwrap();
        for v in frame.column(RSI).unwrap().iter().flatten() {
            assert!((0.0..=100.0).contains(v));
        }
    }

    #[test]
    fn forty_nine_rows_is_enough_for_indicators() {
        let closes: Vec<f64> = (0..49).map(|i| 50.0 + i as f64).collect();
        let frame = compute_indicators(frame_from_closes(&closes)).unwrap();
        assert!(frame.column(SMA_50).unwrap().iter().all(Option::is_none));
        assert!(frame.value(SMA_20, 48).is_some());
    }
}

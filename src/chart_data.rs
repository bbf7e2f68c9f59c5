// =============================================================================
// Chart Data Preparer — projection of the signal frame for the dashboard
// =============================================================================
//
// No analysis happens here: every value is copied from the frame or the
// signal rows. Dates are rendered as `YYYY-MM-DD`; undefined values stay
// `None` and serialise as `null`.
// =============================================================================

use std::collections::BTreeMap;

use serde::Serialize;

use crate::errors::AnalysisError;
use crate::indicators::columns::*;
use crate::market_data::{defined, whole_shares, Column};
use crate::signals::SignalFrame;
use crate::types::{CompositeLabel, SignalLabel};

const BUY_MARKER_FACTOR: f64 = 0.99;
const SELL_MARKER_FACTOR: f64 = 1.01;

#[derive(Debug, Clone, Serialize)]
pub struct CandlestickChart {
    pub x: Vec<String>,
    pub open: Column,
    pub high: Column,
    pub low: Column,
    pub close: Column,
    pub sma_20: Column,
    pub sma_50: Column,
    pub bb_upper: Column,
    pub bb_lower: Column,
    pub buy_signals: Vec<String>,
    pub buy_prices: Column,
    pub sell_signals: Vec<String>,
    pub sell_prices: Column,
}

#[derive(Debug, Clone, Serialize)]
pub struct RsiChart {
    pub x: Vec<String>,
    pub rsi: Column,
}

#[derive(Debug, Clone, Serialize)]
pub struct MacdChart {
    pub x: Vec<String>,
    pub macd: Column,
    pub signal_line: Column,
    pub histogram: Column,
    pub histogram_colors: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HistoricalRow {
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<u64>,
    pub signal: CompositeLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentSignalRow {
    #[serde(rename = "RSI")]
    pub rsi: SignalLabel,
    #[serde(rename = "MACD")]
    pub macd: SignalLabel,
    #[serde(rename = "MA Cross")]
    pub ma_cross: SignalLabel,
    #[serde(rename = "Bollinger")]
    pub bollinger: SignalLabel,
    #[serde(rename = "Volume")]
    pub volume: SignalLabel,
    #[serde(rename = "Signal")]
    pub signal: CompositeLabel,
    #[serde(rename = "Strength")]
    pub strength: i32,
}

/// Everything the dashboard plots, keyed the way the front-end reads it.
#[derive(Debug, Clone, Serialize)]
pub struct ChartBundle {
    pub candlestick: CandlestickChart,
    pub rsi: RsiChart,
    pub macd: MacdChart,
    pub historical_data: BTreeMap<String, HistoricalRow>,
    pub recent_signals: BTreeMap<String, RecentSignalRow>,
}

fn histogram_color(value: Option<f64>) -> &'static str {
    match value {
        Some(v) if v >= 0.0 => "green",
        _ => "red",
    }
}

/// Dates and marker prices for bars labelled `label`.
fn markers(
    dates: &[String],
    signals: &SignalFrame,
    prices: &[Option<f64>],
    label: CompositeLabel,
    factor: f64,
) -> (Vec<String>, Column) {
    signals
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| row.label == label)
        .map(|(i, _)| (dates[i].clone(), prices[i].and_then(|p| defined(p * factor))))
        .unzip()
}

/// Project the signal frame into chart series; `recent_rows` caps the
/// sub-signal table to the trailing rows.
pub fn prepare_chart_data(signals: &SignalFrame, recent_rows: usize) -> Result<ChartBundle, AnalysisError> {
    let frame = &signals.frame;
    let x: Vec<String> = frame
        .dates()
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    let lows = frame.lows();
    let highs = frame.highs();
    let (buy_signals, buy_prices) = markers(&x, signals, &lows, CompositeLabel::StrongBuy, BUY_MARKER_FACTOR);
    let (sell_signals, sell_prices) =
        markers(&x, signals, &highs, CompositeLabel::StrongSell, SELL_MARKER_FACTOR);

    let candlestick = CandlestickChart {
        x: x.clone(),
        open: frame.opens(),
        high: highs,
        low: lows,
        close: frame.closes(),
        sma_20: frame.column(SMA_20)?.to_vec(),
        sma_50: frame.column(SMA_50)?.to_vec(),
        bb_upper: frame.column(BB_UPPER)?.to_vec(),
        bb_lower: frame.column(BB_LOWER)?.to_vec(),
        buy_signals,
        buy_prices,
        sell_signals,
        sell_prices,
    };

    let rsi = RsiChart {
        x: x.clone(),
        rsi: frame.column(RSI)?.to_vec(),
    };

    let histogram = frame.column(MACD_HISTOGRAM)?.to_vec();
    let macd = MacdChart {
        x: x.clone(),
        macd: frame.column(MACD)?.to_vec(),
        signal_line: frame.column(SIGNAL_LINE)?.to_vec(),
        histogram_colors: histogram.iter().map(|v| histogram_color(*v)).collect(),
        histogram,
    };

    let historical_data = frame
        .points()
        .iter()
        .zip(&signals.rows)
        .zip(&x)
        .map(|((p, row), date)| {
            (
                date.clone(),
                HistoricalRow {
                    open: p.open,
                    high: p.high,
                    low: p.low,
                    close: p.close,
                    volume: whole_shares(p.volume),
                    signal: row.label,
                },
            )
        })
        .collect();

    let skip = signals.rows.len().saturating_sub(recent_rows);
    let recent_signals = signals
        .rows
        .iter()
        .zip(&x)
        .skip(skip)
        .map(|(row, date)| {
            (
                date.clone(),
                RecentSignalRow {
                    rsi: row.rsi,
                    macd: row.macd,
                    ma_cross: row.ma_crossover,
                    bollinger: row.bollinger,
                    volume: row.volume,
                    signal: row.label,
                    strength: row.score,
                },
            )
        })
        .collect();

    Ok(ChartBundle {
        candlestick,
        rsi,
        macd,
        historical_data,
        recent_signals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicators;
    use crate::market_data::{PricePoint, TimeSeriesFrame};
    use crate::signals::generate_signals;
    use chrono::{Duration, NaiveDate};

    fn ascending_signals(n: usize) -> SignalFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                PricePoint {
                    date: start + Duration::days(i as i64),
                    open: Some(c),
                    high: Some(c + 2.0),
                    low: Some(c - 2.0),
                    close: Some(c),
                    volume: Some(1_000.0),
                }
            })
            .collect();
        let frame = compute_indicators(TimeSeriesFrame::new("TEST", points)).unwrap();
        generate_signals(frame).unwrap()
    }

    #[test]
    fn single_strong_buy_appears_in_markers_and_table() {
        let signals = ascending_signals(60);
        let strong: Vec<usize> = signals
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.label == CompositeLabel::StrongBuy)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(strong, vec![1]);

        // Keep the whole history in the recent table.
        let bundle = prepare_chart_data(&signals, 60).unwrap();
        assert_eq!(bundle.candlestick.buy_signals, vec!["2024-01-02".to_string()]);
        let price = bundle.candlestick.buy_prices[0].unwrap();
        assert!((price - 99.0 * 0.99).abs() < 1e-9);
        assert!(bundle.candlestick.sell_signals.is_empty());
        assert_eq!(
            bundle.recent_signals["2024-01-02"].signal,
            CompositeLabel::StrongBuy
        );
    }

    #[test]
    fn recent_table_keeps_trailing_rows() {
        let bundle = prepare_chart_data(&ascending_signals(60), 10).unwrap();
        assert_eq!(bundle.recent_signals.len(), 10);
        assert_eq!(bundle.historical_data.len(), 60);
        let first = bundle.recent_signals.keys().next().unwrap();
        assert_eq!(first, "2024-02-20");
    }

    #[test]
    fn series_are_aligned_with_dates() {
        let bundle = prepare_chart_data(&ascending_signals(55), 10).unwrap();
        assert_eq!(bundle.candlestick.x.len(), 55);
        assert_eq!(bundle.candlestick.sma_50.len(), 55);
        assert_eq!(bundle.rsi.rsi.len(), 55);
        assert_eq!(bundle.macd.histogram_colors.len(), 55);
    }

    #[test]
    fn warm_up_values_serialize_as_null() {
        let bundle = prepare_chart_data(&ascending_signals(55), 10).unwrap();
        let json = serde_json::to_value(&bundle).unwrap();
        assert!(json["candlestick"]["sma_20"][0].is_null());
        assert!(json["candlestick"]["sma_50"][48].is_null());
        assert!(json["candlestick"]["sma_50"][49].is_number());
        assert!(json["rsi"]["rsi"][0].is_null());
        assert_eq!(json["historical_data"]["2024-01-01"]["Signal"], "NEUTRAL");
        assert!(json["historical_data"]["2024-01-01"]["Volume"].is_u64());
        assert_eq!(json["historical_data"]["2024-01-01"]["Volume"], 1000);
        assert_eq!(json["recent_signals"]["2024-02-24"]["MA Cross"], "NEUTRAL");
    }

    #[test]
    fn histogram_colours() {
        assert_eq!(histogram_color(Some(0.0)), "green");
        assert_eq!(histogram_color(Some(0.3)), "green");
        assert_eq!(histogram_color(Some(-0.1)), "red");
        assert_eq!(histogram_color(None), "red");
    }
}

// =============================================================================
// Metrics Synthesizer — scalar snapshot of the latest bar
// =============================================================================
//
// Flattens the last row of the signal frame (plus a few trailing aggregates)
// into the dashboard's key/value mapping. Prices and ratios are rounded to
// two decimals and share counts to whole numbers; anything undefined
// serialises as `null`.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::errors::AnalysisError;
use crate::indicators::columns::*;
use crate::indicators::rolling::{rolling_mean, rolling_std};
use crate::market_data::{defined, whole_shares, Column};
use crate::signals::SignalFrame;
use crate::types::{CompositeLabel, SignalLabel};

/// Minimum number of bars required for a snapshot.
pub const MIN_METRIC_ROWS: usize = 20;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const VOLATILITY_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Current Price")]
    pub current_price: Option<f64>,
    #[serde(rename = "Price Change %")]
    pub price_change_pct: Option<f64>,
    #[serde(rename = "Volume")]
    pub volume: Option<u64>,
    #[serde(rename = "Avg Volume (20D)")]
    pub avg_volume_20d: Option<f64>,
    #[serde(rename = "Volume Ratio")]
    pub volume_ratio: Option<f64>,
    #[serde(rename = "RSI")]
    pub rsi: Option<f64>,
    #[serde(rename = "MACD")]
    pub macd: Option<f64>,
    #[serde(rename = "Signal Line")]
    pub signal_line: Option<f64>,
    #[serde(rename = "MACD Histogram")]
    pub macd_histogram: Option<f64>,
    #[serde(rename = "Above SMA20")]
    pub above_sma20: Option<String>,
    #[serde(rename = "Above SMA50")]
    pub above_sma50: Option<String>,
    #[serde(rename = "EMA9 vs EMA21")]
    pub ema9_vs_ema21: Option<String>,
    #[serde(rename = "BB Position")]
    pub bb_position: Option<f64>,
    #[serde(rename = "ATR")]
    pub atr: Option<f64>,
    #[serde(rename = "ATR %")]
    pub atr_pct: Option<f64>,
    #[serde(rename = "Volatility (20D)")]
    pub volatility_20d: Option<f64>,
    #[serde(rename = "RSI Signal")]
    pub rsi_signal: SignalLabel,
    #[serde(rename = "MACD Signal")]
    pub macd_signal: SignalLabel,
    #[serde(rename = "MA Crossover Signal")]
    pub ma_crossover_signal: SignalLabel,
    #[serde(rename = "Price-SMA Signal")]
    pub price_sma_signal: SignalLabel,
    #[serde(rename = "BB Signal")]
    pub bb_signal: SignalLabel,
    #[serde(rename = "Volume Signal")]
    pub volume_signal: SignalLabel,
    #[serde(rename = "Signal")]
    pub signal: CompositeLabel,
    #[serde(rename = "Signal Strength")]
    pub signal_strength: i32,
}

fn round2(value: Option<f64>) -> Option<f64> {
    value.and_then(|v| defined((v * 100.0).round() / 100.0))
}

/// Python-style "True"/"False" flag, `None` when either side is undefined.
fn above(lhs: Option<f64>, rhs: Option<f64>) -> Option<String> {
    let (l, r) = (lhs?, rhs?);
    Some(if l > r { "True" } else { "False" }.to_string())
}

fn daily_returns(closes: &[Option<f64>]) -> Column {
    (0..closes.len())
        .map(|i| {
            let prev = closes.get(i.checked_sub(1)?).copied().flatten()?;
            defined(closes[i]? / prev - 1.0)
        })
        .collect()
}

/// Annualised sample volatility of the trailing daily returns, in percent.
pub fn annualized_volatility(closes: &[Option<f64>]) -> Option<f64> {
    let std = rolling_std(&daily_returns(closes), VOLATILITY_WINDOW)
        .last()
        .copied()
        .flatten()?;
    defined(std * TRADING_DAYS_PER_YEAR.sqrt() * 100.0)
}

/// Build the latest-state snapshot from a signal frame.
pub fn synthesize_metrics(signals: &SignalFrame) -> Result<MetricsSnapshot, AnalysisError> {
    let frame = &signals.frame;
    let n = frame.len();
    if n < MIN_METRIC_ROWS {
        return Err(AnalysisError::InsufficientHistory {
            stage: "calculate metrics",
            required: MIN_METRIC_ROWS,
            actual: n,
        });
    }
    let last = n - 1;
    let row = signals
        .latest()
        .ok_or_else(|| AnalysisError::Computation("signal rows missing for latest bar".into()))?;

    let closes = frame.closes();
    let volumes = frame.volumes();
    let close = closes[last];
    let prev_close = closes[last - 1];
    let volume = volumes[last];
    let avg_volume = rolling_mean(&volumes, 20)[last];

    let price_change_pct = match (close, prev_close) {
        (Some(c), Some(p)) => defined((c - p) / p * 100.0),
        _ => None,
    };
    let volume_ratio = match (volume, avg_volume) {
        (Some(v), Some(a)) => defined(v / a),
        _ => None,
    };

    let bb_lower = frame.value(BB_LOWER, last);
    let bb_upper = frame.value(BB_UPPER, last);
    // Unclamped: leaves [0, 1] when price pierces a band.
    let bb_position = match (close, bb_lower, bb_upper) {
        (Some(c), Some(l), Some(u)) => defined((c - l) / (u - l)),
        _ => None,
    };

    let atr = frame.value(ATR, last);
    let atr_pct = match (atr, close) {
        (Some(a), Some(c)) => defined(a / c * 100.0),
        _ => None,
    };

    let ema9 = frame.value(EMA_9, last);
    let ema21 = frame.value(EMA_21, last);
    let ema9_vs_ema21 = match (ema9, ema21) {
        (Some(fast), Some(slow)) => Some(if fast > slow { "ABOVE" } else { "BELOW" }.to_string()),
        _ => None,
    };

    let snapshot = MetricsSnapshot {
        symbol: frame.symbol().to_string(),
        current_price: round2(close),
        price_change_pct: round2(price_change_pct),
        volume: whole_shares(volume),
        avg_volume_20d: avg_volume.and_then(|v| defined(v.round())),
        volume_ratio: round2(volume_ratio),
        rsi: round2(frame.value(RSI, last)),
        macd: round2(frame.value(MACD, last)),
        signal_line: round2(frame.value(SIGNAL_LINE, last)),
        macd_histogram: round2(frame.value(MACD_HISTOGRAM, last)),
        above_sma20: above(close, frame.value(SMA_20, last)),
        above_sma50: above(close, frame.value(SMA_50, last)),
        ema9_vs_ema21,
        bb_position: round2(bb_position),
        atr: round2(atr),
        atr_pct: round2(atr_pct),
        volatility_20d: round2(annualized_volatility(&closes)),
        rsi_signal: row.rsi,
        macd_signal: row.macd,
        ma_crossover_signal: row.ma_crossover,
        price_sma_signal: row.price_sma,
        bb_signal: row.bollinger,
        volume_signal: row.volume,
        signal: row.label,
        signal_strength: row.score,
    };

    debug!(symbol = %snapshot.symbol, signal = %snapshot.signal, "metrics synthesized");
    Ok(snapshot)
}

// =============================================================================
// Signal Generator — six sub-signal votes and a composite label per bar
// =============================================================================
//
//   RSI         BUY RSI < 30                     SELL RSI > 70
//   MACD        BUY MACD crosses above signal    SELL crosses below
//   MA          BUY EMA_9 crosses above EMA_21   SELL crosses below
//   Price-SMA   BUY close > SMA_50, SMA_20 > SMA_50   SELL both inverted
//   Bollinger   BUY close < lower band           SELL close > upper band
//   Volume      BUY ratio > 1.5 on an up close   SELL ratio > 1.5 on a down close
//
// Crossovers compare bar i with bar i-1 only. Any comparison touching a
// missing value is NEUTRAL.
// =============================================================================

use serde::Serialize;
use tracing::debug;

use crate::errors::AnalysisError;
use crate::indicators::columns::*;
use crate::indicators::rolling::rolling_mean;
use crate::market_data::{defined, Column, TimeSeriesFrame};
use crate::types::{CompositeLabel, SignalLabel};

/// Minimum number of bars required to generate signals.
pub const MIN_SIGNAL_ROWS: usize = 50;

const RSI_OVERSOLD: f64 = 30.0;
const RSI_OVERBOUGHT: f64 = 70.0;
const VOLUME_SPIKE_RATIO: f64 = 1.5;
const VOLUME_WINDOW: usize = 20;

/// Sub-signal votes and composite verdict for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SignalRow {
    pub rsi: SignalLabel,
    pub macd: SignalLabel,
    pub ma_crossover: SignalLabel,
    pub price_sma: SignalLabel,
    pub bollinger: SignalLabel,
    pub volume: SignalLabel,
    pub score: i32,
    pub label: CompositeLabel,
}

impl SignalRow {
    fn from_votes(
        rsi: SignalLabel,
        macd: SignalLabel,
        ma_crossover: SignalLabel,
        price_sma: SignalLabel,
        bollinger: SignalLabel,
        volume: SignalLabel,
    ) -> Self {
        let score = [rsi, macd, ma_crossover, price_sma, bollinger, volume]
            .iter()
            .map(|s| s.vote())
            .sum();
        Self {
            rsi,
            macd,
            ma_crossover,
            price_sma,
            bollinger,
            volume,
            score,
            label: CompositeLabel::from_score(score),
        }
    }
}

/// Indicator frame extended with `Volume_Ratio`, plus one [`SignalRow`] per bar.
#[derive(Debug, Clone)]
pub struct SignalFrame {
    pub frame: TimeSeriesFrame,
    pub rows: Vec<SignalRow>,
}

impl SignalFrame {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn latest(&self) -> Option<&SignalRow> {
        self.rows.last()
    }
}

/// Vote BUY/SELL on a threshold comparison.
fn threshold(value: Option<f64>, buy: impl Fn(f64) -> bool, sell: impl Fn(f64) -> bool) -> SignalLabel {
    match value {
        Some(v) if buy(v) => SignalLabel::Buy,
        Some(v) if sell(v) => SignalLabel::Sell,
        _ => SignalLabel::Neutral,
    }
}

/// Detect a crossing of `fast` over `slow` between bar i-1 and bar i.
fn crossover(fast: &[Option<f64>], slow: &[Option<f64>], i: usize) -> SignalLabel {
    let Some(prev) = i.checked_sub(1) else {
        return SignalLabel::Neutral;
    };
    match (fast[i], slow[i], fast[prev], slow[prev]) {
        (Some(f), Some(s), Some(pf), Some(ps)) if f > s && pf <= ps => SignalLabel::Buy,
        (Some(f), Some(s), Some(pf), Some(ps)) if f < s && pf >= ps => SignalLabel::Sell,
        _ => SignalLabel::Neutral,
    }
}

fn price_vs_sma(close: Option<f64>, sma20: Option<f64>, sma50: Option<f64>) -> SignalLabel {
    match (close, sma20, sma50) {
        (Some(c), Some(s20), Some(s50)) if c > s50 && s20 > s50 => SignalLabel::Buy,
        (Some(c), Some(s20), Some(s50)) if c < s50 && s20 < s50 => SignalLabel::Sell,
        _ => SignalLabel::Neutral,
    }
}

fn bollinger(close: Option<f64>, lower: Option<f64>, upper: Option<f64>) -> SignalLabel {
    match (close, lower, upper) {
        (Some(c), Some(l), _) if c < l => SignalLabel::Buy,
        (Some(c), _, Some(u)) if c > u => SignalLabel::Sell,
        _ => SignalLabel::Neutral,
    }
}

fn volume(ratio: Option<f64>, closes: &[Option<f64>], i: usize) -> SignalLabel {
    let Some(ratio) = ratio.filter(|r| *r > VOLUME_SPIKE_RATIO) else {
        return SignalLabel::Neutral;
    };
    let prev = i.checked_sub(1).and_then(|p| closes[p]);
    match (closes[i], prev) {
        (Some(c), Some(p)) if c > p => SignalLabel::Buy,
        (Some(c), Some(p)) if c < p => SignalLabel::Sell,
        _ => {
            debug!(ratio, "volume spike on a flat close");
            SignalLabel::Neutral
        }
    }
}

/// Volume divided by its trailing 20-bar mean.
pub fn volume_ratio(volumes: &[Option<f64>]) -> Column {
    rolling_mean(volumes, VOLUME_WINDOW)
        .iter()
        .zip(volumes)
        .map(|(avg, v)| defined((*v)? / (*avg)?))
        .collect()
}

/// Derive the six sub-signals and composite score for every bar.
pub fn generate_signals(frame: TimeSeriesFrame) -> Result<SignalFrame, AnalysisError> {
    if frame.len() < MIN_SIGNAL_ROWS {
        return Err(AnalysisError::InsufficientHistory {
            stage: "generate signals",
            required: MIN_SIGNAL_ROWS,
            actual: frame.len(),
        });
    }

    let ratio = volume_ratio(&frame.volumes());
    let frame = frame.with_column(VOLUME_RATIO, ratio)?;

    let closes = frame.closes();
    let rsi = frame.column(RSI)?;
    let macd = frame.column(MACD)?;
    let signal_line = frame.column(SIGNAL_LINE)?;
    let ema9 = frame.column(EMA_9)?;
    let ema21 = frame.column(EMA_21)?;
    let sma20 = frame.column(SMA_20)?;
    let sma50 = frame.column(SMA_50)?;
    let bb_lower = frame.column(BB_LOWER)?;
    let bb_upper = frame.column(BB_UPPER)?;
    let ratio = frame.column(VOLUME_RATIO)?;

    let rows: Vec<SignalRow> = (0..frame.len())
        .map(|i| {
            SignalRow::from_votes(
                threshold(rsi[i], |v| v < RSI_OVERSOLD, |v| v > RSI_OVERBOUGHT),
                crossover(macd, signal_line, i),
                crossover(ema9, ema21, i),
                price_vs_sma(closes[i], sma20[i], sma50[i]),
                bollinger(closes[i], bb_lower[i], bb_upper[i]),
                volume(ratio[i], &closes, i),
            )
        })
        .collect();

    if let Some(last) = rows.last() {
        debug!(
            symbol = frame.symbol(),
            rows = rows.len(),
            score = last.score,
            label = %last.label,
            "signals generated"
        );
    }

    Ok(SignalFrame { frame, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::compute_indicators;
    use crate::market_data::PricePoint;
    use chrono::{Duration, NaiveDate};

    fn frame_from(closes: &[f64], volumes: &[f64]) -> TimeSeriesFrame {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = closes
            .iter()
            .zip(volumes)
            .enumerate()
            .map(|(i, (&c, &v))| PricePoint {
                date: start + Duration::days(i as i64),
                open: Some(c),
                high: Some(c + 0.5),
                low: Some(c - 0.5),
                close: Some(c),
                volume: Some(v),
            })
            .collect();
        TimeSeriesFrame::new("TEST", points)
    }

    fn ascending(n: usize) -> TimeSeriesFrame {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
        frame_from(&closes, &vec![1_000_000.0; n])
    }

    #[test]
    fn forty_nine_rows_fail_signal_generation() {
        let frame = compute_indicators(ascending(49)).unwrap();
        let err = generate_signals(frame).unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InsufficientHistory {
                stage: "generate signals",
                required: MIN_SIGNAL_ROWS,
                actual: 49,
            }
        );
    }

    #[test]
    fn single_macd_cross_up_gives_exactly_one_buy() {
        let frame = compute_indicators(ascending(60)).unwrap();
        // Histogram negative until bar 40, positive afterwards.
        let macd: Column = (0..60).map(|i| Some(if i < 40 { -1.0 } else { 1.0 })).collect();
        let signal: Column = vec![Some(0.0); 60];
        let frame = frame
            .with_column(MACD, macd)
            .unwrap()
            .with_column(SIGNAL_LINE, signal)
            .unwrap();

        let signals = generate_signals(frame).unwrap();
        let buys: Vec<usize> = signals
            .rows
            .iter()
            .enumerate()
            .filter(|(_, r)| r.macd == SignalLabel::Buy)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(buys, vec![40]);
        assert!(signals.rows.iter().all(|r| r.macd != SignalLabel::Sell));
    }

    #[test]
    fn decline_then_rebound_crosses_macd_once() {
        // 40 falling bars (140 -> 101), then 30 rising bars (102 -> 131).
        let closes: Vec<f64> = (0..40)
            .map(|i| 140.0 - i as f64)
            .chain((0..30).map(|i| 102.0 + i as f64))
            .collect();
        let frame = compute_indicators(frame_from(&closes, &vec![1_000_000.0; 70])).unwrap();
        let signals = generate_signals(frame).unwrap();

        let f = &signals.frame;
        assert!(f.value(MACD_HISTOGRAM, 40).unwrap() < 0.0);
        assert!(f.value(MACD_HISTOGRAM, 41).unwrap() > 0.0);

        let by_label = |label: SignalLabel| -> Vec<usize> {
            signals
                .rows
                .iter()
                .enumerate()
                .filter(|(_, r)| r.macd == label)
                .map(|(i, _)| i)
                .collect()
        };
        assert_eq!(by_label(SignalLabel::Buy), vec![41]);
        // The only downward cross is the first bar turning away from the seed.
        assert_eq!(by_label(SignalLabel::Sell), vec![1]);
    }

    #[test]
    fn crossover_needs_both_bars() {
        let fast = vec![None, Some(2.0), Some(0.0)];
        let slow = vec![Some(1.0), Some(1.0), Some(1.0)];
        assert_eq!(crossover(&fast, &slow, 0), SignalLabel::Neutral);
        assert_eq!(crossover(&fast, &slow, 1), SignalLabel::Neutral);
        assert_eq!(crossover(&fast, &slow, 2), SignalLabel::Sell);
    }

    #[test]
    fn composite_score_is_sum_of_votes() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.21).sin() * 12.0 + (i as f64 * 0.05).cos() * 6.0)
            .collect();
        let volumes: Vec<f64> = (0..120)
            .map(|i| if i % 7 == 0 { 3_000.0 } else { 1_000.0 })
            .collect();
        let frame = compute_indicators(frame_from(&closes, &volumes)).unwrap();
        let signals = generate_signals(frame).unwrap();

        for row in &signals.rows {
            let sum: i32 = [row.rsi, row.macd, row.ma_crossover, row.price_sma, row.bollinger, row.volume]
                .iter()
                .map(|s| s.vote())
                .sum();
            assert_eq!(row.score, sum);
            assert!((-6..=6).contains(&row.score));
            assert_eq!(row.label, CompositeLabel::from_score(row.score));
        }
    }

    #[test]
    fn volume_spike_follows_close_direction() {
        let mut closes = vec![100.0; 60];
        let mut volumes = vec![1_000.0; 60];
        closes[55] = 101.0;
        volumes[55] = 5_000.0;
        closes[57] = 99.0;
        volumes[57] = 5_000.0;
        let frame = compute_indicators(frame_from(&closes, &volumes)).unwrap();
        let signals = generate_signals(frame).unwrap();

        assert_eq!(signals.rows[55].volume, SignalLabel::Buy);
        assert_eq!(signals.rows[56].volume, SignalLabel::Neutral);
        assert_eq!(signals.rows[57].volume, SignalLabel::Sell);
        assert!(signals.frame.column(VOLUME_RATIO).is_ok());
    }

    #[test]
    fn steady_uptrend_scenario() {
        let frame = compute_indicators(ascending(60)).unwrap();
        let signals = generate_signals(frame).unwrap();
        let f = &signals.frame;

        for i in 49..60 {
            assert!(f.value(SMA_20, i).unwrap() > f.value(SMA_50, i).unwrap());
            assert!(f.value(EMA_9, i).unwrap() > f.value(EMA_21, i).unwrap());
            assert_eq!(signals.rows[i].price_sma, SignalLabel::Buy);
        }

        let last_rsi = f.value(RSI, 59).unwrap();
        assert!(last_rsi > 70.0);
        assert_ne!(signals.rows[59].rsi, SignalLabel::Buy);

        assert!(signals.rows.iter().all(|r| r.bollinger == SignalLabel::Neutral));
        assert!(signals.rows.iter().all(|r| r.volume == SignalLabel::Neutral));

        // Both averages and MACD turn up together on the second bar.
        assert_eq!(signals.rows[1].ma_crossover, SignalLabel::Buy);
        assert_eq!(signals.rows[1].label, CompositeLabel::StrongBuy);
    }
}

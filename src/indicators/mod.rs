// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the technical indicators used by
// the analysis pipeline. Every function returns a series aligned with its
// input, with `None` wherever the value is not yet (or not) defined.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod engine;
pub mod macd;
pub mod rolling;
pub mod rsi;

pub use engine::compute_indicators;

/// Column names attached to the frame by the indicator engine.
pub mod columns {
    pub const SMA_20: &str = "SMA_20";
    pub const SMA_50: &str = "SMA_50";
    pub const EMA_9: &str = "EMA_9";
    pub const EMA_21: &str = "EMA_21";
    pub const RSI: &str = "RSI";
    pub const MACD: &str = "MACD";
    pub const SIGNAL_LINE: &str = "Signal_Line";
    pub const MACD_HISTOGRAM: &str = "MACD_Histogram";
    pub const BB_MIDDLE: &str = "BB_Middle";
    pub const BB_STD: &str = "BB_Std";
    pub const BB_UPPER: &str = "BB_Upper";
    pub const BB_LOWER: &str = "BB_Lower";
    pub const TR: &str = "TR";
    pub const ATR: &str = "ATR";
    pub const VOLUME_RATIO: &str = "Volume_Ratio";
}

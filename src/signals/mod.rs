// =============================================================================
// Signals Module
// =============================================================================
//
// Turns the indicator frame into per-bar BUY/SELL/NEUTRAL votes and a
// composite score.

pub mod generator;

pub use generator::{generate_signals, SignalFrame};

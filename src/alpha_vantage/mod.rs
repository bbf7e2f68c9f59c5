pub mod client;
pub mod payload;

pub use client::AlphaVantageClient;
pub use payload::{DailySeriesPayload, Fundamentals};

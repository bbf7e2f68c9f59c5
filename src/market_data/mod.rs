pub mod frame;
pub mod normalizer;

pub use frame::{defined, whole_shares, Column, PricePoint, TimeSeriesFrame};
pub use normalizer::{normalize_payload, RawRow};

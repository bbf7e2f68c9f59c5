use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::errors::AnalysisError;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One daily bar. A field that could not be coerced from the upstream payload
/// is `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

/// A derived series aligned index-for-index with the price sequence.
pub type Column = Vec<Option<f64>>;

/// Collapse non-finite arithmetic results into the explicit "no value" marker.
pub fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Share counts go on the wire as whole numbers.
pub fn whole_shares(value: Option<f64>) -> Option<u64> {
    value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u64)
}

// ---------------------------------------------------------------------------
// TimeSeriesFrame
// ---------------------------------------------------------------------------

/// Ordered daily bars plus named derived columns.
///
/// Invariants: dates strictly increasing; every column has exactly
/// `points.len()` entries. Stages extend a frame by consuming it and returning
/// a new one via [`TimeSeriesFrame::with_column`]; nothing mutates a frame
/// after it has been handed to the next stage.
#[derive(Debug, Clone)]
pub struct TimeSeriesFrame {
    symbol: String,
    points: Vec<PricePoint>,
    columns: BTreeMap<&'static str, Column>,
}

impl TimeSeriesFrame {
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Self {
        Self {
            symbol: symbol.into(),
            points,
            columns: BTreeMap::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn opens(&self) -> Column {
        self.points.iter().map(|p| p.open).collect()
    }

    pub fn highs(&self) -> Column {
        self.points.iter().map(|p| p.high).collect()
    }

    pub fn lows(&self) -> Column {
        self.points.iter().map(|p| p.low).collect()
    }

    pub fn closes(&self) -> Column {
        self.points.iter().map(|p| p.close).collect()
    }

    pub fn volumes(&self) -> Column {
        self.points.iter().map(|p| p.volume).collect()
    }

    /// Return a new frame with `values` attached under `name`.
    ///
    /// Fails with a computation error when the column is not aligned with the
    /// price sequence.
    pub fn with_column(mut self, name: &'static str, values: Column) -> Result<Self, AnalysisError> {
        if values.len() != self.points.len() {
            return Err(AnalysisError::Computation(format!(
                "column {name} has {} values for {} rows",
                values.len(),
                self.points.len()
            )));
        }
        self.columns.insert(name, values);
        Ok(self)
    }

    pub fn column(&self, name: &str) -> Result<&[Option<f64>], AnalysisError> {
        self.columns
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| AnalysisError::Computation(format!("column {name} has not been computed")))
    }

    /// Value of `name` at `index`, `None` when missing or out of range.
    pub fn value(&self, name: &str, index: usize) -> Option<f64> {
        self.columns.get(name)?.get(index).copied().flatten()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.keys().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(day: u32, close: f64) -> PricePoint {
        PricePoint {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: Some(close),
            high: Some(close),
            low: Some(close),
            close: Some(close),
            volume: Some(1000.0),
        }
    }

    #[test]
    fn with_column_accepts_aligned_values() {
        let frame = TimeSeriesFrame::new("TEST", vec![point(1, 1.0), point(2, 2.0)]);
        let frame = frame.with_column("X", vec![None, Some(1.5)]).unwrap();
        assert!(frame.column("X").is_ok());
        assert_eq!(frame.value("X", 0), None);
        assert_eq!(frame.value("X", 1), Some(1.5));
        assert_eq!(frame.value("X", 2), None);
    }

    #[test]
    fn with_column_rejects_misaligned_values() {
        let frame = TimeSeriesFrame::new("TEST", vec![point(1, 1.0), point(2, 2.0)]);
        let err = frame.with_column("X", vec![Some(1.0)]).unwrap_err();
        assert_eq!(err.kind(), "ComputationError");
    }

    #[test]
    fn missing_column_is_a_computation_error() {
        let frame = TimeSeriesFrame::new("TEST", vec![point(1, 1.0)]);
        assert!(frame.column("SMA_20").is_err());
    }

    #[test]
    fn defined_drops_non_finite() {
        assert_eq!(defined(1.0), Some(1.0));
        assert_eq!(defined(f64::NAN), None);
        assert_eq!(defined(f64::INFINITY), None);
    }
}

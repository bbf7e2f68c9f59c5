// =============================================================================
// Data Normalizer — raw provider rows → ordered daily series
// =============================================================================
//
//   1. Validate that every required column is present in the payload.
//   2. Coerce each numeric field; a value that fails coercion becomes `None`
//      instead of rejecting the row.
//   3. Sort ascending by date; duplicate dates keep the last occurrence.
//   4. Keep only bars on or after `as_of - period.days()`.
// =============================================================================

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value;
use tracing::{debug, warn};

use crate::alpha_vantage::DailySeriesPayload;
use crate::errors::AnalysisError;
use crate::market_data::{PricePoint, TimeSeriesFrame};
use crate::types::Period;

/// Columns every row set must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["open", "high", "low", "close", "volume"];

/// One upstream row before coercion. Values may be string-encoded numbers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub date: String,
    pub fields: BTreeMap<String, Value>,
}

/// Decode a provider payload and normalise it in one step.
pub fn normalize_payload(
    symbol: &str,
    payload: DailySeriesPayload,
    period: Period,
    as_of: NaiveDateTime,
) -> Result<TimeSeriesFrame, AnalysisError> {
    let rows = payload.into_rows(symbol)?;
    normalize(symbol, &rows, period, as_of)
}

/// Normalise raw rows into an ordered, deduplicated, window-restricted frame.
pub fn normalize(
    symbol: &str,
    rows: &[RawRow],
    period: Period,
    as_of: NaiveDateTime,
) -> Result<TimeSeriesFrame, AnalysisError> {
    if rows.is_empty() {
        return Err(AnalysisError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    // A column is missing only when no row carries it; an individual row
    // without the field just gets a missing value.
    for column in REQUIRED_COLUMNS {
        if !rows.iter().any(|r| r.fields.contains_key(column)) {
            return Err(AnalysisError::Schema(format!(
                "required column '{column}' missing from price data for {symbol}"
            )));
        }
    }

    let mut points = Vec::with_capacity(rows.len());
    let mut uncoerced = 0usize;
    for row in rows {
        let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
            AnalysisError::Schema(format!("unparsable date '{}' for {symbol}: {e}", row.date))
        })?;

        let mut field = |name: &str| {
            let value = row.fields.get(name).and_then(coerce_f64);
            if value.is_none() {
                uncoerced += 1;
            }
            value
        };

        points.push(PricePoint {
            date,
            open: field("open"),
            high: field("high"),
            low: field("low"),
            close: field("close"),
            volume: field("volume"),
        });
    }

    if uncoerced > 0 {
        warn!(symbol, uncoerced, "price fields could not be coerced and were marked missing");
    }

    // Stable sort keeps input order among equal dates, so the last
    // occurrence is the one that survives deduplication.
    points.sort_by_key(|p| p.date);
    let mut deduped: Vec<PricePoint> = Vec::with_capacity(points.len());
    for point in points {
        match deduped.last_mut() {
            Some(last) if last.date == point.date => *last = point,
            _ => deduped.push(point),
        }
    }

    let start = as_of - Duration::days(period.days());
    let total = deduped.len();
    deduped.retain(|p| p.date.and_time(NaiveTime::MIN) >= start);

    debug!(
        symbol,
        period = %period,
        total,
        kept = deduped.len(),
        "price series normalised"
    );

    if deduped.is_empty() {
        return Err(AnalysisError::EmptySeries {
            symbol: symbol.to_string(),
        });
    }

    Ok(TimeSeriesFrame::new(symbol, deduped))
}

/// Best-effort numeric coercion; anything non-numeric or non-finite is `None`.
fn coerce_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

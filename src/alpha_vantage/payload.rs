// =============================================================================
// Alpha Vantage response payloads
// =============================================================================
//
// TIME_SERIES_DAILY:
//   { "Meta Data": {...},
//     "Time Series (Daily)": { "2024-01-02": { "1. open": "187.15", ... } } }
//
// Failures come back as HTTP 200 with one of "Error Message", "Note" or
// "Information" in place of the series.
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AnalysisError;
use crate::market_data::RawRow;

/// Upstream column key → normalised column name.
const DAILY_COLUMNS: [(&str, &str); 5] = [
    ("1. open", "open"),
    ("2. high", "high"),
    ("3. low", "low"),
    ("4. close", "close"),
    ("5. volume", "volume"),
];

/// Decoded body of a `TIME_SERIES_DAILY` response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailySeriesPayload {
    #[serde(rename = "Error Message", default)]
    pub error_message: Option<String>,
    #[serde(rename = "Note", default)]
    pub note: Option<String>,
    #[serde(rename = "Information", default)]
    pub information: Option<String>,
    #[serde(rename = "Time Series (Daily)", default)]
    pub time_series: Option<BTreeMap<String, BTreeMap<String, Value>>>,
}

impl DailySeriesPayload {
    /// Turn the payload into raw rows, surfacing upstream-reported failures.
    pub fn into_rows(self, symbol: &str) -> Result<Vec<RawRow>, AnalysisError> {
        if let Some(msg) = self.error_message {
            return Err(AnalysisError::DataSource(format!("Alpha Vantage API error: {msg}")));
        }
        if let Some(msg) = self.note.or(self.information) {
            return Err(AnalysisError::DataSource(format!("Alpha Vantage API notice: {msg}")));
        }
        let series = self.time_series.ok_or_else(|| {
            AnalysisError::DataSource(format!("No daily time series data found for {symbol}"))
        })?;

        Ok(series
            .into_iter()
            .map(|(date, fields)| RawRow {
                date,
                fields: fields
                    .into_iter()
                    .map(|(key, value)| (rename_daily_column(&key), value))
                    .collect(),
            })
            .collect())
    }
}

fn rename_daily_column(key: &str) -> String {
    DAILY_COLUMNS
        .iter()
        .find(|(upstream, _)| *upstream == key)
        .map(|(_, name)| (*name).to_string())
        .unwrap_or_else(|| key.to_string())
}

// =============================================================================
// Company overview
// =============================================================================

/// Flat fundamentals mapping; absent upstream fields become "N/A".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Sector")]
    pub sector: String,
    #[serde(rename = "Industry")]
    pub industry: String,
    #[serde(rename = "Market Cap")]
    pub market_cap: String,
    #[serde(rename = "PE Ratio")]
    pub pe_ratio: String,
    #[serde(rename = "EPS")]
    pub eps: String,
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: String,
    #[serde(rename = "52-Week High")]
    pub week_52_high: String,
    #[serde(rename = "52-Week Low")]
    pub week_52_low: String,
}

impl Fundamentals {
    /// Project an `OVERVIEW` response body.
    ///
    /// An overview with at most one field (Alpha Vantage answers unknown
    /// symbols with `{}` or a lone message) is treated as "no data".
    pub fn from_overview(symbol: &str, body: &Value) -> Result<Self, AnalysisError> {
        let obj = body
            .as_object()
            .filter(|o| o.len() > 1)
            .ok_or_else(|| AnalysisError::DataSource(format!("No fundamental data found for {symbol}")))?;

        let field = |key: &str| -> String {
            match obj.get(key) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => "N/A".to_string(),
                Some(other) => other.to_string(),
            }
        };

        Ok(Self {
            name: field("Name"),
            sector: field("Sector"),
            industry: field("Industry"),
            market_cap: field("MarketCapitalization"),
            pe_ratio: field("PERatio"),
            eps: field("EPS"),
            dividend_yield: field("DividendYield"),
            week_52_high: field("52WeekHigh"),
            week_52_low: field("52WeekLow"),
        })
    }
}

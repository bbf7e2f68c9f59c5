// =============================================================================
// Alpha Vantage REST API Client
// =============================================================================
//
// Two public endpoints are used: TIME_SERIES_DAILY for prices and OVERVIEW
// for fundamentals. Each request is a single bounded call with a fixed
// timeout; nothing is retried. The API key travels as a query parameter and is
// never logged.
// =============================================================================

use std::time::Duration;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::alpha_vantage::payload::{DailySeriesPayload, Fundamentals};
use crate::errors::AnalysisError;
use crate::runtime_config::AnalyzerConfig;
use crate::types::Period;

/// Alpha Vantage REST client.
#[derive(Clone)]
pub struct AlphaVantageClient {
    api_key: String,
    base_url: String,
    price_timeout: Duration,
    fundamentals_timeout: Duration,
    client: reqwest::Client,
}

impl AlphaVantageClient {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create a client from the analyzer configuration.
    pub fn new(config: &AnalyzerConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("stock-analyzer/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to build reqwest client");

        if config.api_key.is_empty() {
            warn!("no Alpha Vantage API key configured; requests will be rejected upstream");
        }
        debug!(base_url = %config.base_url, "AlphaVantageClient initialised");

        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            price_timeout: Duration::from_secs(config.price_timeout_secs),
            fundamentals_timeout: Duration::from_secs(config.fundamentals_timeout_secs),
            client,
        }
    }

    /// `compact` returns the latest 100 bars, enough for one month; anything
    /// longer needs the full history.
    pub fn output_size(period: Period) -> &'static str {
        match period {
            Period::OneMonth => "compact",
            _ => "full",
        }
    }

    // -------------------------------------------------------------------------
    // Endpoints
    // -------------------------------------------------------------------------

    /// GET /query?function=TIME_SERIES_DAILY
    #[instrument(skip(self), name = "alpha_vantage::get_daily_series")]
    pub async fn get_daily_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> Result<DailySeriesPayload, AnalysisError> {
        let resp = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", Self::output_size(period)),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(self.price_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AnalysisError::DataSource(format!(
                "Error fetching data for {symbol}: Status code {}",
                status.as_u16()
            )));
        }

        let payload: DailySeriesPayload = resp.json().await.map_err(|e| {
            AnalysisError::DataSource(format!(
                "Invalid JSON response from Alpha Vantage for {symbol}: {e}"
            ))
        })?;

        debug!(
            symbol,
            rows = payload.time_series.as_ref().map_or(0, |s| s.len()),
            "daily series fetched"
        );
        Ok(payload)
    }

    /// GET /query?function=OVERVIEW
    #[instrument(skip(self), name = "alpha_vantage::get_overview")]
    pub async fn get_overview(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        let resp = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("function", "OVERVIEW"),
                ("symbol", symbol),
                ("apikey", self.api_key.as_str()),
            ])
            .timeout(self.fundamentals_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AnalysisError::DataSource(format!(
                "Error fetching fundamentals for {symbol}: Status code {}",
                status.as_u16()
            )));
        }

        let body: Value = resp.json().await?;
        let fundamentals = Fundamentals::from_overview(symbol, &body)?;

        debug!(symbol, name = %fundamentals.name, "company overview fetched");
        Ok(fundamentals)
    }
}

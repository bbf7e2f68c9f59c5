// =============================================================================
// Analysis Orchestrator
// =============================================================================
//
//   fetch → normalise → indicators → signals → metrics
//                                           ↘ fundamentals (optional)
//                                           ↘ chart data
//
// The first failing stage short-circuits the run. A fundamentals failure is
// the only one that degrades instead of failing: it becomes `null`.
// =============================================================================

use std::future::Future;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::alpha_vantage::{AlphaVantageClient, DailySeriesPayload, Fundamentals};
use crate::chart_data::{prepare_chart_data, ChartBundle};
use crate::errors::AnalysisError;
use crate::indicators::compute_indicators;
use crate::market_data::normalize_payload;
use crate::metrics::{synthesize_metrics, MetricsSnapshot};
use crate::runtime_config::AnalyzerConfig;
use crate::signals::generate_signals;
use crate::types::Period;

/// Provider of daily prices and company fundamentals.
pub trait MarketDataSource: Send + Sync {
    fn daily_series(
        &self,
        symbol: &str,
        period: Period,
    ) -> impl Future<Output = Result<DailySeriesPayload, AnalysisError>> + Send;

    fn overview(&self, symbol: &str) -> impl Future<Output = Result<Fundamentals, AnalysisError>> + Send;
}

impl MarketDataSource for AlphaVantageClient {
    async fn daily_series(&self, symbol: &str, period: Period) -> Result<DailySeriesPayload, AnalysisError> {
        self.get_daily_series(symbol, period).await
    }

    async fn overview(&self, symbol: &str) -> Result<Fundamentals, AnalysisError> {
        self.get_overview(symbol).await
    }
}

/// Successful analysis result.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub metrics: MetricsSnapshot,
    pub fundamentals: Option<Fundamentals>,
    pub chart_data: ChartBundle,
}

/// Wire shape of one analysis: the full report or a single error.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisResponse {
    Success(Box<AnalysisReport>),
    Failure { error: String },
}

impl AnalysisResponse {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

impl From<Result<AnalysisReport, AnalysisError>> for AnalysisResponse {
    fn from(result: Result<AnalysisReport, AnalysisError>) -> Self {
        match result {
            Ok(report) => Self::Success(Box::new(report)),
            Err(e) => Self::Failure { error: e.to_string() },
        }
    }
}

/// Runs the analysis pipeline against a market-data source.
pub struct Analyzer<S> {
    source: S,
    recent_signal_rows: usize,
}

impl<S: MarketDataSource> Analyzer<S> {
    pub fn new(source: S, config: &AnalyzerConfig) -> Self {
        Self {
            source,
            recent_signal_rows: config.recent_signal_rows,
        }
    }

    /// Run the pipeline and fold the outcome into its wire shape.
    pub async fn analyze(&self, symbol: &str, period: Period) -> AnalysisResponse {
        self.run(symbol, period).await.into()
    }

    #[instrument(skip(self), name = "analyzer::run")]
    pub async fn run(&self, symbol: &str, period: Period) -> Result<AnalysisReport, AnalysisError> {
        let payload = self.source.daily_series(symbol, period).await.inspect_err(|e| {
            warn!(symbol, kind = e.kind(), error = %e, "price fetch failed");
        })?;

        let frame = normalize_payload(symbol, payload, period, Utc::now().naive_utc())?;
        let frame = compute_indicators(frame)?;
        let signals = generate_signals(frame)?;
        let metrics = synthesize_metrics(&signals)?;

        let fundamentals = match self.source.overview(symbol).await {
            Ok(f) => Some(f),
            Err(e) => {
                warn!(symbol, error = %e, "fundamentals unavailable");
                None
            }
        };

        let chart_data = prepare_chart_data(&signals, self.recent_signal_rows)?;

        info!(
            symbol,
            rows = signals.len(),
            signal = %metrics.signal,
            strength = metrics.signal_strength,
            "analysis complete"
        );

        Ok(AnalysisReport {
            metrics,
            fundamentals,
            chart_data,
        })
    }
}

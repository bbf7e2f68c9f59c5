// =============================================================================
// Shared Application State
// =============================================================================
//
// Held behind an `Arc` by every HTTP handler. The analyzer itself is
// stateless per request; the only shared mutable data are atomic counters
// reported by the health endpoint.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};

use crate::analysis::{AnalysisResponse, Analyzer, MarketDataSource};
use crate::runtime_config::AnalyzerConfig;
use crate::types::Period;

pub struct AppState<S> {
    pub analyzer: Analyzer<S>,
    /// Period used when a request omits one.
    pub default_period: Period,
    analyses_run: AtomicU64,
    analyses_failed: AtomicU64,
}

impl<S: MarketDataSource> AppState<S> {
    pub fn new(source: S, config: &AnalyzerConfig) -> Self {
        Self {
            analyzer: Analyzer::new(source, config),
            default_period: config.default_period,
            analyses_run: AtomicU64::new(0),
            analyses_failed: AtomicU64::new(0),
        }
    }

    /// Run one analysis and update the counters.
    pub async fn analyze(&self, symbol: &str, period: Period) -> AnalysisResponse {
        let response = self.analyzer.analyze(symbol, period).await;
        self.analyses_run.fetch_add(1, Ordering::Relaxed);
        if response.is_error() {
            self.analyses_failed.fetch_add(1, Ordering::Relaxed);
        }
        response
    }

    pub fn analyses_run(&self) -> u64 {
        self.analyses_run.load(Ordering::Relaxed)
    }

    pub fn analyses_failed(&self) -> u64 {
        self.analyses_failed.load(Ordering::Relaxed)
    }
}

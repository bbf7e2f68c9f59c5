// =============================================================================
// Runtime Configuration — analyzer settings loaded from JSON
// =============================================================================
//
// Settings for the data-source collaborator and the HTTP surface. The
// indicator and signal stages read none of this; the orchestrator hands the
// relevant values to the components that need them.
//
// The file is read once at start-up. All fields carry `#[serde(default)]`
// so that adding new fields never breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::Period;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_base_url() -> String {
    "https://www.alphavantage.co".to_string()
}

fn default_price_timeout_secs() -> u64 {
    15
}

fn default_fundamentals_timeout_secs() -> u64 {
    10
}

fn default_bind_addr() -> String {
    "0.0.0.0:5001".to_string()
}

fn default_recent_signal_rows() -> usize {
    10
}

// =============================================================================
// AnalyzerConfig
// =============================================================================

/// Top-level configuration for the analyzer service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    // --- Data source --------------------------------------------------------

    /// Alpha Vantage API key. Never logged.
    #[serde(default)]
    pub api_key: String,

    /// Base URL of the market-data provider.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for the daily price request, in seconds.
    #[serde(default = "default_price_timeout_secs")]
    pub price_timeout_secs: u64,

    /// Timeout for the company overview request, in seconds.
    #[serde(default = "default_fundamentals_timeout_secs")]
    pub fundamentals_timeout_secs: u64,

    // --- Analysis -----------------------------------------------------------

    /// Period used when a request does not name one.
    #[serde(default)]
    pub default_period: Period,

    /// Number of trailing rows in the recent-signals table.
    #[serde(default = "default_recent_signal_rows")]
    pub recent_signal_rows: usize,

    // --- HTTP ---------------------------------------------------------------

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            price_timeout_secs: default_price_timeout_secs(),
            fundamentals_timeout_secs: default_fundamentals_timeout_secs(),
            default_period: Period::default(),
            recent_signal_rows: default_recent_signal_rows(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl AnalyzerConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read analyzer config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse analyzer config from {}", path.display()))?;

        info!(
            path = %path.display(),
            base_url = %config.base_url,
            default_period = %config.default_period,
            "analyzer config loaded"
        );

        Ok(config)
    }

    /// Apply `ALPHA_VANTAGE_API_KEY` / `ANALYZER_BIND_ADDR` overrides.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("ALPHA_VANTAGE_API_KEY").ok(),
            std::env::var("ANALYZER_BIND_ADDR").ok(),
        );
    }

    fn apply_overrides(&mut self, api_key: Option<String>, bind_addr: Option<String>) {
        if let Some(key) = api_key.map(|k| k.trim().to_string()).filter(|k| !k.is_empty()) {
            self.api_key = key;
        }
        if let Some(addr) = bind_addr.map(|a| a.trim().to_string()).filter(|a| !a.is_empty()) {
            self.bind_addr = addr;
        }
    }
}

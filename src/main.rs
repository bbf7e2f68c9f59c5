// =============================================================================
// Stock Analyzer — Main Entry Point
// =============================================================================
//
//   stock-analyzer                        start the HTTP API
//   stock-analyzer serve                  start the HTTP API
//   stock-analyzer analyze SYMBOL [PERIOD]
//                                         run one analysis, print JSON
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod alpha_vantage;
mod analysis;
mod api;
mod app_state;
mod chart_data;
mod errors;
mod indicators;
mod market_data;
mod metrics;
mod runtime_config;
mod signals;
mod types;

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::alpha_vantage::AlphaVantageClient;
use crate::analysis::Analyzer;
use crate::app_state::AppState;
use crate::runtime_config::AnalyzerConfig;
use crate::types::Period;

const CONFIG_PATH: &str = "analyzer_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = AnalyzerConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AnalyzerConfig::default()
    });
    config.apply_env_overrides();

    // ── 2. Dispatch ──────────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => serve(config).await,
        Some("analyze") => {
            let Some(symbol) = args.get(1) else {
                bail!("usage: stock-analyzer analyze <SYMBOL> [1mo|3mo|6mo|1y]");
            };
            let period = args
                .get(2)
                .map_or(config.default_period, |p| Period::parse_or_default(p));
            analyze_once(&config, symbol, period).await
        }
        Some(other) => bail!("unknown command '{other}' (expected 'serve' or 'analyze')"),
    }
}

/// Run a single analysis and print the result; exit 1 on an error result.
async fn analyze_once(config: &AnalyzerConfig, symbol: &str, period: Period) -> anyhow::Result<()> {
    let symbol = symbol.trim().to_uppercase();
    let analyzer = Analyzer::new(AlphaVantageClient::new(config), config);
    let response = analyzer.analyze(&symbol, period).await;

    let json = serde_json::to_string(&response).context("failed to serialise analysis result")?;
    println!("{json}");

    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn serve(config: AnalyzerConfig) -> anyhow::Result<()> {
    info!("Stock Analyzer starting up");

    let state = Arc::new(AppState::new(AlphaVantageClient::new(&config), &config));
    let app = api::rest::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, period = %config.default_period, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("API server failed")?;

    info!("Stock Analyzer stopped");
    Ok(())
}

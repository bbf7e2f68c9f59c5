// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. No authentication: the service is a
// local dashboard backend.
//
// CORS is configured permissively so the dashboard can be served from any
// origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::analysis::{AnalysisResponse, MarketDataSource};
use crate::app_state::AppState;
use crate::types::Period;

type ApiError = (StatusCode, Json<serde_json::Value>);

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router<S>(state: Arc<AppState<S>>) -> Router
where
    S: MarketDataSource + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health::<S>))
        .route("/api/v1/analyze", post(analyze::<S>))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    analyses_run: u64,
    analyses_failed: u64,
    server_time: i64,
}

async fn health<S: MarketDataSource>(State(state): State<Arc<AppState<S>>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        analyses_run: state.analyses_run(),
        analyses_failed: state.analyses_failed(),
        server_time: chrono::Utc::now().timestamp_millis(),
    })
}

// =============================================================================
// Analyze
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    period: Option<String>,
}

async fn analyze<S: MarketDataSource>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    // Malformed bodies get the same `{error}` shape as every other failure.
    let Json(req) = payload.map_err(|rejection| {
        let error = rejection.body_text();
        warn!(%error, "rejected analyze body");
        (StatusCode::BAD_REQUEST, Json(serde_json::json!({ "error": error })))
    })?;

    let symbol = req.symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": "Symbol is required" })),
        ));
    }
    let period = req
        .period
        .as_deref()
        .map_or(state.default_period, Period::parse_or_default);

    let request_id = Uuid::new_v4();
    let span = info_span!("analyze_request", %request_id, %symbol, %period);

    async move {
        info!("analysis requested");
        match state.analyze(&symbol, period).await {
            AnalysisResponse::Failure { error } => {
                warn!(%error, "analysis failed");
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "error": error })),
                ))
            }
            success => Ok(Json(success)),
        }
    }
    .instrument(span)
    .await
}

// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. The backend is a read-mostly service
// for a single-user dashboard frontend: the frame/summary endpoints serve the
// latest published computation, `refresh` re-runs the pipeline (optionally
// invalidating the cached download first), and `config` switches the tracked
// symbol or date range.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/frame", get(frame))
        .route("/api/v1/summary", get(summary))
        .route("/api/v1/refresh", post(refresh))
        .route("/api/v1/cache/clear", post(clear_cache))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/config", post(set_config))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "state_version": state.current_state_version(),
        "server_time": chrono::Utc::now().timestamp_millis(),
    }))
}

// =============================================================================
// Status snapshot
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

// =============================================================================
// Indicator frame & summary
// =============================================================================

async fn frame(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let frame = state.frame.read().clone();
    match frame {
        Some(f) => Json(&*f).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "no data loaded yet — POST /api/v1/refresh to load"
            })),
        )
            .into_response(),
    }
}

async fn summary(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let summary = state.frame.read().as_ref().and_then(|f| f.return_summary());
    match summary {
        Some(s) => Json(s).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "no return summary available yet"
            })),
        )
            .into_response(),
    }
}

// =============================================================================
// Refresh (caller-controlled cache invalidation)
// =============================================================================

#[derive(Deserialize, Default)]
struct RefreshRequest {
    /// Invalidate the cached download before recomputing.
    #[serde(default)]
    force: bool,
}

async fn refresh(
    State(state): State<Arc<AppState>>,
    body: Option<Json<RefreshRequest>>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let Json(req) = body.unwrap_or_default();

    info!(force = req.force, "refresh requested via API");

    match state.load_frame(req.force).await {
        Ok(frame) => Ok(Json(serde_json::json!({
            "status": "ok",
            "rows": frame.rows(),
            "forced": req.force,
            "state_version": state.current_state_version(),
        }))),
        Err(e) => {
            warn!(error = %e, "refresh failed");
            Err((
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": format!("{e:#}") })),
            ))
        }
    }
}

/// Drop every cached download. The published frame stays as-is until the
/// next refresh.
async fn clear_cache(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dropped = state.cache.len();
    state.cache.clear();
    state.increment_version();
    info!(dropped, "dataset cache cleared via API");

    Json(serde_json::json!({
        "status": "ok",
        "dropped_entries": dropped,
    }))
}

// =============================================================================
// Config
// =============================================================================

async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.runtime_config.read().clone())
}

#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    start_date: Option<NaiveDate>,
    #[serde(default)]
    end_date: Option<NaiveDate>,
}

/// Update the tracked symbol and/or date range, then reload.
///
/// Exactly one symbol is tracked at a time — an update *replaces* the
/// current one. The reload runs against the new (symbol, range) cache key,
/// so a revisited configuration is served from cache.
async fn set_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    let updated = {
        let mut config = state.runtime_config.write();

        if let Some(symbol) = update.symbol {
            let symbol = symbol.trim().to_uppercase();
            if symbol.is_empty() {
                return Err((
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "symbol must not be empty" })),
                ));
            }
            config.symbol = symbol;
        }
        if let Some(start) = update.start_date {
            config.start_date = start;
        }
        if let Some(end) = update.end_date {
            config.end_date = end;
        }

        if config.start_date >= config.end_date {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": format!(
                        "start_date {} must be before end_date {}",
                        config.start_date, config.end_date
                    )
                })),
            ));
        }

        config.clone()
    };

    // Save to disk (best-effort).
    if let Err(e) = updated.save("tessa_config.json") {
        warn!(error = %e, "failed to save updated config to disk");
    }

    state.increment_version();
    info!(symbol = %updated.symbol, start = %updated.start_date, end = %updated.end_date,
        "config updated via API");

    match state.load_frame(false).await {
        Ok(frame) => Ok(Json(serde_json::json!({
            "status": "ok",
            "symbol": updated.symbol,
            "start_date": updated.start_date,
            "end_date": updated.end_date,
            "rows": frame.rows(),
        }))),
        Err(e) => Err((
            StatusCode::BAD_GATEWAY,
            Json(serde_json::json!({
                "error": format!("config saved but reload failed: {e:#}")
            })),
        )),
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::types::{DailyBar, PriceSeries};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt; // for `oneshot`

    fn test_state_with_frame() -> Arc<AppState> {
        let state = Arc::new(AppState::new(RuntimeConfig::default()));
        let start: NaiveDate = "2024-01-01".parse().unwrap();
        let bars: Vec<DailyBar> = (0..60)
            .map(|i| {
                let close = 100.0 + i as f64;
                DailyBar {
                    date: start + chrono::Days::new(i),
                    open: close,
                    high: close,
                    low: close,
                    close,
                    volume: 0.0,
                }
            })
            .collect();
        state
            .cache
            .insert(state.current_cache_key(), Arc::new(PriceSeries::new(bars).unwrap()));
        state
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let app = router(test_state_with_frame());
        let response = app
            .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn frame_is_404_before_first_load() {
        let app = router(Arc::new(AppState::new(RuntimeConfig::default())));
        let response = app
            .oneshot(Request::get("/api/v1/frame").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn refresh_then_frame_roundtrip() {
        let state = test_state_with_frame();
        let app = router(state.clone());

        // Refresh computes from the pre-cached history.
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/v1/refresh")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["rows"], 60);

        // The frame is now served with all ten columns present.
        let response = app
            .oneshot(Request::get("/api/v1/frame").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["dates"].as_array().unwrap().len(), 60);
        for column in [
            "close",
            "ma_fast",
            "ma_slow",
            "rsi",
            "macd",
            "macd_signal",
            "bb_high",
            "bb_low",
            "daily_return",
            "cumulative_return",
        ] {
            assert_eq!(json[column].as_array().unwrap().len(), 60, "column {column}");
        }
        // Warm-up entries serialise as null.
        assert!(json["ma_fast"][0].is_null());
        assert!(json["ma_fast"][19].is_f64());
    }

    #[tokio::test]
    async fn summary_is_served_after_load() {
        let state = test_state_with_frame();
        state.load_frame(false).await.unwrap();

        let app = router(state);
        let response = app
            .oneshot(Request::get("/api/v1/summary").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert!(json["mean_daily_return"].is_f64());
        assert!(json["volatility"].is_f64());
    }

    #[tokio::test]
    async fn cache_clear_drops_entries() {
        let state = test_state_with_frame();
        let app = router(state.clone());

        let response = app
            .oneshot(
                Request::post("/api/v1/cache/clear")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["dropped_entries"], 1);
        assert!(state.cache.is_empty());
    }

    #[tokio::test]
    async fn config_rejects_inverted_range() {
        let app = router(test_state_with_frame());
        let response = app
            .oneshot(
                Request::post("/api/v1/config")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{ "start_date": "2025-01-01", "end_date": "2020-01-01" }"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn config_rejects_blank_symbol() {
        let app = router(test_state_with_frame());
        let response = app
            .oneshot(
                Request::post("/api/v1/config")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{ "symbol": "   " }"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Tessa — Single-Stock Technical Analysis Backend — Main Entry Point
// =============================================================================
//
// Downloads the configured symbol's daily history, computes the indicator
// frame (moving averages, RSI, MACD, Bollinger Bands, returns) and serves it
// to the dashboard frontend over REST. The initial load runs in the
// background so a dead data provider never blocks startup — the dashboard
// can retry via POST /api/v1/refresh.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod indicators;
mod market_data;
mod pipeline;
mod runtime_config;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

/// Config file path, shared with the API's config-update handler.
const CONFIG_PATH: &str = "tessa_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Tessa Technical Analysis — Starting Up            ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override the tracked symbol from env if available.
    if let Ok(symbol) = std::env::var("TESSA_SYMBOL") {
        let symbol = symbol.trim().to_uppercase();
        if !symbol.is_empty() {
            config.symbol = symbol;
        }
    }

    info!(
        symbol = %config.symbol,
        start = %config.start_date,
        end = %config.end_date,
        "Configured analysis target"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Initial data load (background) ────────────────────────────────
    let load_state = state.clone();
    tokio::spawn(async move {
        match load_state.load_frame(false).await {
            Ok(frame) => {
                info!(rows = frame.rows(), "initial indicator frame ready");
            }
            Err(e) => {
                error!(error = %e, "initial data load failed — retry via POST /api/v1/refresh");
            }
        }
    });

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr = std::env::var("TESSA_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind API server on {bind_addr}: {e}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    server_handle.abort();
    info!("Tessa shut down complete.");
    Ok(())
}

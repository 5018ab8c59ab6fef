use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::services;
use crate::AppState;

/// POST /api/pause — Freeze the simulation clock.
pub async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(true, Ordering::Relaxed);
    tracing::warn!("Simulation PAUSED via control API");
    (StatusCode::OK, Json(json!({ "status": "paused" })))
}

/// POST /api/resume — Resume ticks and scripted events.
pub async fn resume(State(state): State<AppState>) -> impl IntoResponse {
    state.pause_flag.store(false, Ordering::Relaxed);
    tracing::info!("Simulation RESUMED via control API");
    (StatusCode::OK, Json(json!({ "status": "running" })))
}

/// GET /api/status — Current system status.
pub async fn status(State(state): State<AppState>) -> impl IntoResponse {
    let paused = state.pause_flag.load(Ordering::Relaxed);
    let summary = state.game.summary().await;
    let coins = state.game.coins().await.len();

    Json(json!({
        "paused": paused,
        "uptime_secs": state.started_at.elapsed().as_secs(),
        "balance": summary.balance,
        "open_positions": summary.open_positions,
        "coins": coins,
        "liquidation_policy": state.config.liquidation_policy,
    }))
}

/// POST /api/reset — Back to a fresh account. Settings and the running
/// market are kept; the wiped state is persisted immediately.
pub async fn reset(State(state): State<AppState>) -> impl IntoResponse {
    state.game.reset().await;
    services::publish_market(&state.game, &state.ws_tx).await;
    services::persist(&state.game, &state.store).await;

    let summary = state.game.summary().await;
    (
        StatusCode::OK,
        Json(json!({ "status": "reset", "balance": summary.balance })),
    )
}

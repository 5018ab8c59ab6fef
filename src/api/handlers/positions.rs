use axum::extract::{Path, State};
use axum::Json;
use metrics::counter;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::api::ws_types::{OpenPositionView, WsMessage};
use crate::errors::AppError;
use crate::models::{Position, Side};
use crate::services;
use crate::AppState;

pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<OpenPositionView>>> {
    let views = state
        .game
        .positions_with_pnl()
        .await
        .into_iter()
        .map(|(position, unrealized_pnl)| OpenPositionView {
            position,
            unrealized_pnl,
        })
        .collect();

    Json(ApiResponse {
        success: true,
        data: Some(views),
        error: None,
    })
}

#[derive(Deserialize)]
pub struct OpenRequest {
    pub side: String,
    pub amount: f64,
}

pub async fn open(
    State(state): State<AppState>,
    Json(req): Json<OpenRequest>,
) -> Result<Json<ApiResponse<Position>>, AppError> {
    let side = Side::from_api_str(&req.side)
        .ok_or_else(|| AppError::BadRequest(format!("unknown side: {}", req.side)))?;

    let position = state.game.open_position(side, req.amount).await?;
    counter!("positions_opened_total").increment(1);
    services::publish_market(&state.game, &state.ws_tx).await;

    Ok(Json(ApiResponse {
        success: true,
        data: Some(position),
        error: None,
    }))
}

#[derive(Serialize)]
pub struct CloseResult {
    pub pnl: f64,
    pub balance: f64,
}

pub async fn close(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Json<ApiResponse<CloseResult>> {
    let pnl = match state.game.close_position(id).await {
        Some(record) => {
            counter!("positions_closed_total").increment(1);
            let pnl = record.pnl;
            let _ = state.ws_tx.send(WsMessage::TradeExecuted(record));
            services::publish_market(&state.game, &state.ws_tx).await;
            pnl
        }
        // unknown ids are a no-op so double-clicks and stale UI are safe
        None => 0.0,
    };

    let balance = state.game.summary().await.balance;
    Json(ApiResponse {
        success: true,
        data: Some(CloseResult { pnl, balance }),
        error: None,
    })
}

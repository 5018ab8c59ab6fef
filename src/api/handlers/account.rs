use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::engine::AccountSummary;
use crate::errors::AppError;
use crate::AppState;

pub async fn summary(State(state): State<AppState>) -> Json<ApiResponse<AccountSummary>> {
    Json(ApiResponse {
        success: true,
        data: Some(state.game.summary().await),
        error: None,
    })
}

/// Partial update: only the fields present are applied. Fields are applied
/// in declaration order and the first invalid one aborts with a 400;
/// already-applied fields keep their new values.
#[derive(Deserialize)]
pub struct SettingsRequest {
    pub leverage: Option<u32>,
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub coin: Option<String>,
}

pub async fn update_settings(
    State(state): State<AppState>,
    Json(req): Json<SettingsRequest>,
) -> Result<Json<ApiResponse<AccountSummary>>, AppError> {
    if let Some(leverage) = req.leverage {
        state.game.set_leverage(leverage).await?;
    }
    if let Some(pct) = req.stop_loss_pct {
        state.game.set_stop_loss_pct(pct).await?;
    }
    if let Some(pct) = req.take_profit_pct {
        state.game.set_take_profit_pct(pct).await?;
    }
    if let Some(coin) = &req.coin {
        state.game.set_current_coin(coin).await?;
    }

    Ok(Json(ApiResponse {
        success: true,
        data: Some(state.game.summary().await),
        error: None,
    }))
}

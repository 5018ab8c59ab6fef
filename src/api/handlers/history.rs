use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use super::ApiResponse;
use crate::models::TradeRecord;
use crate::AppState;

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

/// Trade history, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<ApiResponse<Vec<TradeRecord>>> {
    let trades = state.game.history(query.limit).await;
    Json(ApiResponse {
        success: true,
        data: Some(trades),
        error: None,
    })
}

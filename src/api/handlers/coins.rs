use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use super::ApiResponse;
use crate::errors::AppError;
use crate::models::{Coin, PricePoint};
use crate::AppState;

/// A coin without its chart payload; `/api/coins/:name/history` serves that.
#[derive(Serialize)]
pub struct CoinView {
    pub name: String,
    pub price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub trend: f64,
    pub volume: f64,
}

impl From<&Coin> for CoinView {
    fn from(coin: &Coin) -> Self {
        Self {
            name: coin.name.clone(),
            price: coin.price,
            min_price: coin.min_price,
            max_price: coin.max_price,
            trend: coin.trend,
            volume: coin.volume,
        }
    }
}

pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<CoinView>>> {
    let coins = state.game.coins().await;
    Json(ApiResponse {
        success: true,
        data: Some(coins.iter().map(CoinView::from).collect()),
        error: None,
    })
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<usize>,
}

pub async fn history(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<PricePoint>>>, AppError> {
    let samples = state
        .game
        .coin_history(&name, query.limit)
        .await
        .ok_or_else(|| AppError::NotFound(format!("unknown coin: {name}")))?;

    Ok(Json(ApiResponse {
        success: true,
        data: Some(samples),
        error: None,
    }))
}

use std::cmp::Ordering;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use super::ApiResponse;
use crate::AppState;

#[derive(Serialize, Clone)]
pub struct LeaderboardEntry {
    pub id: u64,
    pub name: String,
    pub balance: f64,
    pub pnl: f64,
    pub is_you: bool,
}

/// Fictional rivals the player competes against. Their numbers never move.
const RIVALS: &[(u64, &str, f64, f64)] = &[
    (1, "Trader Max", 2450.50, 1450.50),
    (2, "Crypto Wolf", 1890.75, 890.75),
    (3, "Bitcoin Joe", 1567.30, 567.30),
    (4, "Satoshi Nakamoto", 1320.10, 320.10),
    (5, "Anon", 1125.80, 125.80),
    (6, "Rookie", 950.40, -49.60),
    (7, "Bagholder", 650.20, -349.80),
];

pub async fn list(State(state): State<AppState>) -> Json<ApiResponse<Vec<LeaderboardEntry>>> {
    let summary = state.game.summary().await;

    let mut entries: Vec<LeaderboardEntry> = RIVALS
        .iter()
        .map(|&(id, name, balance, pnl)| LeaderboardEntry {
            id,
            name: name.to_string(),
            balance,
            pnl,
            is_you: false,
        })
        .collect();

    entries.push(LeaderboardEntry {
        id: 0,
        name: "You".to_string(),
        balance: summary.balance,
        pnl: summary.total_pnl,
        is_you: true,
    });

    entries.sort_by(|a, b| b.balance.partial_cmp(&a.balance).unwrap_or(Ordering::Equal));

    Json(ApiResponse {
        success: true,
        data: Some(entries),
        error: None,
    })
}

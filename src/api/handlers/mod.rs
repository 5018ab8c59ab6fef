pub mod account;
pub mod coins;
pub mod control;
pub mod health;
pub mod history;
pub mod leaderboard;
pub mod metrics;
pub mod positions;
pub mod ws;

use serde::Serialize;

/// Uniform JSON envelope for the `/api` handlers.
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

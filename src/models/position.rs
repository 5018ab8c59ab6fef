use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Side;

/// An open leveraged position. Stop/take/liquidation prices are fixed from
/// the entry price when the position is opened and never move afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub id: u64,
    pub coin: String,
    pub side: Side,
    pub entry_price: f64,
    pub amount: f64,
    pub leverage: u32,
    /// Last seen price of the coin, refreshed on every tick.
    pub current_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub liquidation_price: f64,
    pub opened_at: DateTime<Utc>,
}

impl Position {
    /// Margin reserved from the balance while this position is open.
    pub fn margin(&self) -> f64 {
        self.amount * self.leverage as f64
    }

    /// P&L valued at `mark`; positive when the price moved with the side.
    pub fn unrealized_pnl(&self, mark: f64) -> f64 {
        self.side.direction() * (mark - self.entry_price) * self.amount * self.leverage as f64
    }
}

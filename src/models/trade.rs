use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// How a trade history entry came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeAction {
    Open,
    Close,
    StopLoss,
    TakeProfit,
    Liquidated,
}

impl TradeAction {
    /// Terminal actions carry realized pnl; OPEN does not.
    pub fn is_closing(&self) -> bool {
        !matches!(self, TradeAction::Open)
    }
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TradeAction::Open => "OPEN",
            TradeAction::Close => "CLOSE",
            TradeAction::StopLoss => "STOP_LOSS",
            TradeAction::TakeProfit => "TAKE_PROFIT",
            TradeAction::Liquidated => "LIQUIDATED",
        };
        write!(f, "{s}")
    }
}

/// Immutable trade history record. `id` mirrors the originating position id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: u64,
    pub coin: String,
    pub side: Side,
    pub entry_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_price: Option<f64>,
    pub amount: f64,
    pub leverage: u32,
    pub action: TradeAction,
    pub pnl: f64,
    pub timestamp: DateTime<Utc>,
}

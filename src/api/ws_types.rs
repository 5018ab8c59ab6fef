use serde::Serialize;

use crate::models::{MarketEvent, Position, TradeRecord};

/// Messages broadcast to all connected WebSocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    #[serde(rename = "price_update")]
    PriceUpdate(Vec<CoinTick>),

    #[serde(rename = "positions_update")]
    PositionsUpdate(Vec<OpenPositionView>),

    #[serde(rename = "market_event")]
    MarketEvent(MarketEvent),

    #[serde(rename = "trade_executed")]
    TradeExecuted(TradeRecord),

    #[serde(rename = "liquidation")]
    Liquidation(LiquidationNotice),
}

/// One coin's live price for the ticker strip and chart tail.
#[derive(Debug, Clone, Serialize)]
pub struct CoinTick {
    pub name: String,
    pub price: f64,
    pub trend: f64,
    pub volume: f64,
    pub time: i64,
}

/// An open position with its live valuation.
#[derive(Debug, Clone, Serialize)]
pub struct OpenPositionView {
    #[serde(flatten)]
    pub position: Position,
    pub unrealized_pnl: f64,
}

/// Shown as the full-screen liquidation banner.
#[derive(Debug, Clone, Serialize)]
pub struct LiquidationNotice {
    pub position_id: u64,
    pub coin: String,
    pub lost_margin: f64,
    pub balance: f64,
}

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::engine::evaluator::TickOutcome;
use crate::engine::state::{GameState, TradeError};
use crate::models::{Coin, MarketEvent, Position, PricePoint, Side, TradeAction, TradeRecord};
use crate::store::GameSnapshot;

/// Cloneable handle to the shared game state.
///
/// The tick loop, the event scheduler and user commands all run against
/// the same state; taking the lock for the full mutation keeps them
/// serialized, so a tick can never interleave with a command mid-update.
#[derive(Clone)]
pub struct Game {
    inner: Arc<Mutex<GameState>>,
}

/// Account overview for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct AccountSummary {
    pub balance: f64,
    pub total_pnl: f64,
    pub open_positions: usize,
    pub current_coin: String,
    pub leverage: u32,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
}

impl Game {
    pub fn new(state: GameState) -> Self {
        Self {
            inner: Arc::new(Mutex::new(state)),
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub async fn open_position(&self, side: Side, amount: f64) -> Result<Position, TradeError> {
        let mut state = self.inner.lock().await;
        match state.open_position(side, amount, Utc::now()) {
            Ok(position) => {
                tracing::info!(
                    position_id = position.id,
                    coin = %position.coin,
                    side = %position.side,
                    amount,
                    leverage = position.leverage,
                    entry = position.entry_price,
                    "Position opened"
                );
                Ok(position)
            }
            Err(err) => {
                tracing::warn!(side = %side, amount, error = %err, "Open rejected");
                Err(err)
            }
        }
    }

    /// Manual close at the live mark. `None` when the id is unknown, which
    /// callers treat as a benign zero-pnl no-op.
    pub async fn close_position(&self, id: u64) -> Option<TradeRecord> {
        let mut state = self.inner.lock().await;
        match state.close_internal(id, TradeAction::Close, Utc::now()) {
            Some((record, pnl)) => {
                tracing::info!(position_id = id, pnl, "Position closed");
                Some(record)
            }
            None => {
                tracing::debug!(position_id = id, "Close ignored: unknown position");
                None
            }
        }
    }

    pub async fn set_leverage(&self, leverage: u32) -> Result<(), TradeError> {
        self.inner.lock().await.set_leverage(leverage)
    }

    pub async fn set_stop_loss_pct(&self, pct: f64) -> Result<(), TradeError> {
        self.inner.lock().await.set_stop_loss_pct(pct)
    }

    pub async fn set_take_profit_pct(&self, pct: f64) -> Result<(), TradeError> {
        self.inner.lock().await.set_take_profit_pct(pct)
    }

    pub async fn set_current_coin(&self, name: &str) -> Result<(), TradeError> {
        self.inner.lock().await.set_current_coin(name)
    }

    pub async fn reset(&self) {
        let mut state = self.inner.lock().await;
        state.reset();
        tracing::warn!("Game reset to a fresh account");
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// One simulation step over every coin plus a full evaluator pass.
    pub async fn advance_tick(&self) -> TickOutcome {
        self.inner.lock().await.advance_tick(Utc::now())
    }

    /// Fires the next scripted market event, if any coin exists to target.
    pub async fn fire_next_event(&self) -> Option<(MarketEvent, TickOutcome)> {
        self.inner.lock().await.fire_next_event(Utc::now())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub async fn positions(&self) -> Vec<Position> {
        self.inner.lock().await.positions.clone()
    }

    /// Open positions with unrealized pnl valued at the live mark.
    pub async fn positions_with_pnl(&self) -> Vec<(Position, f64)> {
        let state = self.inner.lock().await;
        state
            .positions
            .iter()
            .map(|p| {
                let mark = state
                    .coins
                    .get(&p.coin)
                    .map(|c| c.price)
                    .unwrap_or(p.current_price);
                (p.clone(), p.unrealized_pnl(mark))
            })
            .collect()
    }

    pub async fn history(&self, limit: Option<usize>) -> Vec<TradeRecord> {
        self.inner.lock().await.history(limit).to_vec()
    }

    /// All coins in stable name order.
    pub async fn coins(&self) -> Vec<Coin> {
        let state = self.inner.lock().await;
        state
            .coin_names()
            .iter()
            .filter_map(|name| state.coin(name).cloned())
            .collect()
    }

    pub async fn coin(&self, name: &str) -> Option<Coin> {
        self.inner.lock().await.coin(name).cloned()
    }

    /// Most recent `limit` chart samples for a coin, oldest first.
    pub async fn coin_history(&self, name: &str, limit: Option<usize>) -> Option<Vec<PricePoint>> {
        let state = self.inner.lock().await;
        let coin = state.coin(name)?;
        let samples = match limit {
            Some(n) if n < coin.history.len() => &coin.history[coin.history.len() - n..],
            _ => &coin.history[..],
        };
        Some(samples.to_vec())
    }

    pub async fn total_pnl(&self) -> f64 {
        self.inner.lock().await.total_pnl()
    }

    pub async fn summary(&self) -> AccountSummary {
        let state = self.inner.lock().await;
        AccountSummary {
            balance: state.balance,
            total_pnl: state.total_pnl(),
            open_positions: state.positions.len(),
            current_coin: state.current_coin.clone(),
            leverage: state.leverage,
            stop_loss_pct: state.stop_loss_pct,
            take_profit_pct: state.take_profit_pct,
        }
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.inner.lock().await.snapshot(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluator::LiquidationPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_game() -> Game {
        Game::new(GameState::new(
            LiquidationPolicy::WipeAccount,
            StdRng::seed_from_u64(42),
            Utc::now(),
        ))
    }

    #[tokio::test]
    async fn clones_share_one_state() {
        let game = test_game();
        let other = game.clone();

        let amount = 10.0;
        let position = game.open_position(Side::Long, amount).await.unwrap();
        assert_eq!(other.positions().await.len(), 1);

        let record = other.close_position(position.id).await.unwrap();
        assert!(record.pnl.abs() < 1.0, "no tick between open and close");
        assert!(game.positions().await.is_empty());
        assert!(game.close_position(position.id).await.is_none());
    }

    #[tokio::test]
    async fn tick_moves_every_coin() {
        let game = test_game();
        let before: Vec<f64> = game.coins().await.iter().map(|c| c.price).collect();
        game.advance_tick().await;
        let after = game.coins().await;
        assert_eq!(before.len(), after.len());
        for coin in &after {
            assert!(coin.price >= coin.min_price && coin.price <= coin.max_price);
            assert_eq!(coin.history.last().unwrap().value, coin.price);
        }
    }

    #[tokio::test]
    async fn event_fires_and_marks_timestamp() {
        let game = test_game();
        let (event, _) = game.fire_next_event().await.unwrap();
        assert!(event.fired_at.is_some());
        let coin = game.coin(&event.coin).await.unwrap();
        assert_eq!(coin.trend, event.impact.signum());
    }

    #[tokio::test]
    async fn coin_history_respects_limit() {
        let game = test_game();
        let full = game.coin_history("SHIBA", None).await.unwrap();
        let tail = game.coin_history("SHIBA", Some(10)).await.unwrap();
        assert_eq!(tail.len(), 10);
        assert_eq!(tail.last(), full.last());
        assert!(game.coin_history("DOGE", None).await.is_none());
    }

    #[tokio::test]
    async fn summary_reflects_account() {
        let game = test_game();
        game.open_position(Side::Long, 100.0).await.unwrap();
        let summary = game.summary().await;
        assert_eq!(summary.open_positions, 1);
        assert!((summary.balance - 500.0).abs() < 1e-9);
        assert_eq!(summary.leverage, 5);
    }
}

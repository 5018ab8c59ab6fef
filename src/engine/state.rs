use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use thiserror::Error;

use crate::engine::evaluator::{self, LiquidationPolicy, TickOutcome};
use crate::market::generator;
use crate::market::EventQueue;
use crate::models::coin::COIN_CATALOG;
use crate::models::{Coin, MarketEvent, Position, Side, TradeAction, TradeRecord};
use crate::store::{CoinState, GameSnapshot};

pub const DEFAULT_BALANCE: f64 = 1000.0;
pub const DEFAULT_LEVERAGE: u32 = 5;
pub const DEFAULT_STOP_LOSS_PCT: f64 = 5.0;
pub const DEFAULT_TAKE_PROFIT_PCT: f64 = 10.0;
pub const DEFAULT_COIN: &str = "SHIBA";

/// Rejected ledger commands. Validation failures never mutate state.
#[derive(Debug, Error)]
pub enum TradeError {
    #[error("amount must be positive, got {0}")]
    NonPositiveAmount(f64),

    #[error("insufficient balance: required {required:.2}, available {available:.2}")]
    InsufficientBalance { required: f64, available: f64 },

    #[error("unknown coin: {0}")]
    UnknownCoin(String),

    #[error("leverage must be at least 1, got {0}")]
    InvalidLeverage(u32),

    #[error("percentage must be positive, got {0}")]
    InvalidPercent(f64),
}

/// The whole game in one place: account, coin table, open positions and
/// trade history. All mutation is synchronous; callers drive time by
/// passing `now` into the tick/event/command entry points.
pub struct GameState {
    pub balance: f64,
    pub leverage: u32,
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub current_coin: String,
    pub coins: HashMap<String, Coin>,
    pub positions: Vec<Position>,
    /// Newest first. Unbounded in memory; capped only when snapshotted.
    pub history: Vec<TradeRecord>,
    pub liquidation_policy: LiquidationPolicy,
    next_position_id: u64,
    events: EventQueue,
    rng: StdRng,
}

impl GameState {
    /// Fresh game: default account, catalog coins with seeded charts.
    pub fn new(policy: LiquidationPolicy, rng: StdRng, now: DateTime<Utc>) -> Self {
        let mut state = Self {
            balance: DEFAULT_BALANCE,
            leverage: DEFAULT_LEVERAGE,
            stop_loss_pct: DEFAULT_STOP_LOSS_PCT,
            take_profit_pct: DEFAULT_TAKE_PROFIT_PCT,
            current_coin: DEFAULT_COIN.to_string(),
            coins: HashMap::new(),
            positions: Vec::new(),
            history: Vec::new(),
            liquidation_policy: policy,
            next_position_id: 1,
            events: EventQueue::new(),
            rng,
        };
        state.seed_coins(now);
        state
    }

    /// Restore from a snapshot. Coin charts are re-seeded and then pinned
    /// to the persisted spot price; unknown coins in the snapshot are
    /// ignored.
    pub fn from_snapshot(
        snapshot: GameSnapshot,
        policy: LiquidationPolicy,
        rng: StdRng,
        now: DateTime<Utc>,
    ) -> Self {
        let mut state = Self::new(policy, rng, now);
        state.balance = snapshot.balance;
        state.leverage = snapshot.leverage;
        state.stop_loss_pct = snapshot.stop_loss_pct;
        state.take_profit_pct = snapshot.take_profit_pct;
        if state.coins.contains_key(&snapshot.current_coin) {
            state.current_coin = snapshot.current_coin;
        }
        for (name, persisted) in snapshot.coins {
            if let Some(coin) = state.coins.get_mut(&name) {
                if persisted.price > 0.0 {
                    coin.price = persisted.price.clamp(coin.min_price, coin.max_price);
                    let last = coin.history.len().saturating_sub(1);
                    if let Some(point) = coin.history.get_mut(last) {
                        point.value = coin.price;
                    }
                }
                coin.trend = persisted.trend.clamp(-1.0, 1.0);
                coin.volume = persisted.volume.max(0.0);
            }
        }
        state.positions = snapshot
            .positions
            .into_iter()
            .filter(|p| state.coins.contains_key(&p.coin))
            .collect();
        state.history = snapshot.history;

        let max_seen = state
            .positions
            .iter()
            .map(|p| p.id)
            .chain(state.history.iter().map(|t| t.id))
            .max()
            .unwrap_or(0);
        state.next_position_id = snapshot.next_position_id.max(max_seen + 1).max(1);
        state
    }

    fn seed_coins(&mut self, now: DateTime<Utc>) {
        self.coins = COIN_CATALOG
            .iter()
            .map(|profile| {
                let coin = generator::init_coin(profile, now, &mut self.rng);
                (coin.name.clone(), coin)
            })
            .collect();
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Coin names in stable (sorted) order.
    pub fn coin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.coins.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn coin(&self, name: &str) -> Option<&Coin> {
        self.coins.get(name)
    }

    /// Realized pnl of every closing history entry plus unrealized pnl of
    /// every open position at the current mark. Recomputed on demand.
    pub fn total_pnl(&self) -> f64 {
        let realized: f64 = self
            .history
            .iter()
            .filter(|t| t.action.is_closing())
            .map(|t| t.pnl)
            .sum();
        let unrealized: f64 = self
            .positions
            .iter()
            .filter_map(|p| self.coins.get(&p.coin).map(|c| p.unrealized_pnl(c.price)))
            .sum();
        realized + unrealized
    }

    /// Trade history, newest first.
    pub fn history(&self, limit: Option<usize>) -> &[TradeRecord] {
        match limit {
            Some(n) => &self.history[..n.min(self.history.len())],
            None => &self.history,
        }
    }

    // -----------------------------------------------------------------------
    // Settings
    // -----------------------------------------------------------------------

    /// Settings apply to subsequently opened positions only.
    pub fn set_leverage(&mut self, leverage: u32) -> Result<(), TradeError> {
        if leverage < 1 {
            return Err(TradeError::InvalidLeverage(leverage));
        }
        self.leverage = leverage;
        Ok(())
    }

    pub fn set_stop_loss_pct(&mut self, pct: f64) -> Result<(), TradeError> {
        if pct <= 0.0 {
            return Err(TradeError::InvalidPercent(pct));
        }
        self.stop_loss_pct = pct;
        Ok(())
    }

    pub fn set_take_profit_pct(&mut self, pct: f64) -> Result<(), TradeError> {
        if pct <= 0.0 {
            return Err(TradeError::InvalidPercent(pct));
        }
        self.take_profit_pct = pct;
        Ok(())
    }

    pub fn set_current_coin(&mut self, name: &str) -> Result<(), TradeError> {
        if !self.coins.contains_key(name) {
            return Err(TradeError::UnknownCoin(name.to_string()));
        }
        self.current_coin = name.to_string();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Ledger commands
    // -----------------------------------------------------------------------

    /// Opens a position on the currently selected coin at its live price.
    ///
    /// Reserves `amount × leverage` from the balance up front; the margin
    /// is only returned by one of the closure paths. Stop, take and
    /// liquidation prices are fixed here from the entry price.
    pub fn open_position(
        &mut self,
        side: Side,
        amount: f64,
        now: DateTime<Utc>,
    ) -> Result<Position, TradeError> {
        if amount <= 0.0 || !amount.is_finite() {
            return Err(TradeError::NonPositiveAmount(amount));
        }
        let coin_name = self.current_coin.clone();
        let entry = self
            .coins
            .get(&coin_name)
            .ok_or_else(|| TradeError::UnknownCoin(coin_name.clone()))?
            .price;

        let margin = amount * self.leverage as f64;
        if margin > self.balance {
            return Err(TradeError::InsufficientBalance {
                required: margin,
                available: self.balance,
            });
        }

        let dir = side.direction();
        let position = Position {
            id: self.next_position_id,
            coin: coin_name.clone(),
            side,
            entry_price: entry,
            amount,
            leverage: self.leverage,
            current_price: entry,
            stop_loss: entry * (1.0 - dir * self.stop_loss_pct / 100.0),
            take_profit: entry * (1.0 + dir * self.take_profit_pct / 100.0),
            liquidation_price: entry * (1.0 - dir / self.leverage as f64),
            opened_at: now,
        };
        self.next_position_id += 1;

        self.balance -= margin;
        if let Some(coin) = self.coins.get_mut(&coin_name) {
            coin.volume += margin;
        }
        self.push_record(TradeRecord {
            id: position.id,
            coin: coin_name,
            side,
            entry_price: entry,
            exit_price: None,
            amount,
            leverage: position.leverage,
            action: TradeAction::Open,
            pnl: 0.0,
            timestamp: now,
        });
        self.positions.push(position.clone());
        Ok(position)
    }

    /// Manual close at the coin's live price. Unknown ids are a benign
    /// no-op returning 0.0 so double-clicks and stale UI state are safe.
    pub fn close_position(&mut self, id: u64, now: DateTime<Utc>) -> f64 {
        match self.close_internal(id, TradeAction::Close, now) {
            Some((_, pnl)) => pnl,
            None => 0.0,
        }
    }

    /// Shared closure path for manual, stop-loss and take-profit exits:
    /// returns the full posted margin plus signed pnl to the balance.
    pub(crate) fn close_internal(
        &mut self,
        id: u64,
        action: TradeAction,
        now: DateTime<Utc>,
    ) -> Option<(TradeRecord, f64)> {
        let idx = self.positions.iter().position(|p| p.id == id)?;
        let position = self.positions.remove(idx);
        let exit = self
            .coins
            .get(&position.coin)
            .map(|c| c.price)
            .unwrap_or(position.current_price);
        let pnl = position.unrealized_pnl(exit);

        self.balance += position.margin() + pnl;
        if let Some(coin) = self.coins.get_mut(&position.coin) {
            coin.volume += position.margin();
        }

        let record = TradeRecord {
            id: position.id,
            coin: position.coin.clone(),
            side: position.side,
            entry_price: position.entry_price,
            exit_price: Some(exit),
            amount: position.amount,
            leverage: position.leverage,
            action,
            pnl,
            timestamp: now,
        };
        self.push_record(record.clone());
        Some((record, pnl))
    }

    /// Forced closure: the posted margin is lost in full. Depending on the
    /// configured policy this wipes the whole account or only removes the
    /// breached position.
    pub(crate) fn liquidate(&mut self, id: u64, now: DateTime<Utc>) -> Option<TradeRecord> {
        let idx = self.positions.iter().position(|p| p.id == id)?;
        let position = self.positions[idx].clone();
        let exit = self
            .coins
            .get(&position.coin)
            .map(|c| c.price)
            .unwrap_or(position.current_price);

        let record = TradeRecord {
            id: position.id,
            coin: position.coin.clone(),
            side: position.side,
            entry_price: position.entry_price,
            exit_price: Some(exit),
            amount: position.amount,
            leverage: position.leverage,
            action: TradeAction::Liquidated,
            pnl: -position.margin(),
            timestamp: now,
        };
        self.push_record(record.clone());

        match self.liquidation_policy {
            LiquidationPolicy::WipeAccount => {
                self.balance = 0.0;
                self.positions.clear();
            }
            LiquidationPolicy::SingleAtFault => {
                self.positions.remove(idx);
            }
        }
        Some(record)
    }

    fn push_record(&mut self, record: TradeRecord) {
        self.history.insert(0, record);
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// One simulation step: advance every coin, then evaluate all open
    /// positions against their thresholds.
    pub fn advance_tick(&mut self, now: DateTime<Utc>) -> TickOutcome {
        for coin in self.coins.values_mut() {
            generator::advance(coin, now, &mut self.rng);
        }
        evaluator::evaluate(self, now)
    }

    /// Pops the next scripted event and applies its price shock, then runs
    /// the evaluator since the price moved outside the regular tick.
    /// `None` only when the coin table is empty.
    pub fn fire_next_event(&mut self, now: DateTime<Utc>) -> Option<(MarketEvent, TickOutcome)> {
        let names = self.coin_names();
        let mut event = self.events.next_event(&names, &mut self.rng)?;
        event.fired_at = Some(now);
        if let Some(coin) = self.coins.get_mut(&event.coin) {
            generator::apply_shock(coin, event.impact, now, &mut self.rng);
        }
        let outcome = evaluator::evaluate(self, now);
        Some((event, outcome))
    }

    /// Back to a fresh account. Settings and the running market are kept;
    /// balance, positions and history start over.
    pub fn reset(&mut self) {
        self.balance = DEFAULT_BALANCE;
        self.positions.clear();
        self.history.clear();
    }

    // -----------------------------------------------------------------------
    // Snapshot
    // -----------------------------------------------------------------------

    pub fn snapshot(&self, now: DateTime<Utc>) -> GameSnapshot {
        GameSnapshot {
            balance: self.balance,
            positions: self.positions.clone(),
            history: self
                .history
                .iter()
                .take(GameSnapshot::HISTORY_CAP)
                .cloned()
                .collect(),
            current_coin: self.current_coin.clone(),
            leverage: self.leverage,
            stop_loss_pct: self.stop_loss_pct,
            take_profit_pct: self.take_profit_pct,
            coins: self
                .coins
                .iter()
                .map(|(name, coin)| {
                    (
                        name.clone(),
                        CoinState {
                            price: coin.price,
                            volume: coin.volume,
                            trend: coin.trend,
                        },
                    )
                })
                .collect(),
            next_position_id: self.next_position_id,
            saved_at: Some(now),
        }
    }
}

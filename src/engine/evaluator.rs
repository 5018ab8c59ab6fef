use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::engine::state::GameState;
use crate::models::{Position, TradeAction, TradeRecord};

/// What happens to the account when a position breaches its liquidation
/// price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LiquidationPolicy {
    /// Zero the balance and clear every open position.
    #[default]
    WipeAccount,
    /// Forfeit only the breached position's margin; the rest keep running.
    SingleAtFault,
}

impl FromStr for LiquidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wipe" | "wipe_account" => Ok(LiquidationPolicy::WipeAccount),
            "single" | "single_at_fault" => Ok(LiquidationPolicy::SingleAtFault),
            other => Err(format!("unknown liquidation policy: {other}")),
        }
    }
}

/// Priority-ordered closure triggers. Liquidation always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Liquidation,
    StopLoss,
    TakeProfit,
}

/// First matching trigger for a position at `mark`, or `None`.
///
/// Checked strictly in priority order; when the price has blown through
/// several thresholds in one tick only the highest-priority one fires.
pub fn check_trigger(position: &Position, mark: f64) -> Option<Trigger> {
    let dir = position.side.direction();
    if dir * (mark - position.liquidation_price) <= 0.0 {
        return Some(Trigger::Liquidation);
    }
    if dir * (mark - position.stop_loss) <= 0.0 {
        return Some(Trigger::StopLoss);
    }
    if dir * (mark - position.take_profit) >= 0.0 {
        return Some(Trigger::TakeProfit);
    }
    None
}

/// Everything the evaluator did in one pass, for broadcasting.
#[derive(Debug, Default, Clone)]
pub struct TickOutcome {
    /// Records appended by triggered closures, in trigger order.
    pub closed: Vec<TradeRecord>,
    pub liquidated: bool,
}

impl TickOutcome {
    pub fn is_quiet(&self) -> bool {
        self.closed.is_empty()
    }
}

/// Scans every open position once: refreshes its mark price, then fires
/// the first matching trigger. A wipe liquidation empties the open set, so
/// the scan stops there.
pub fn evaluate(state: &mut GameState, now: DateTime<Utc>) -> TickOutcome {
    let ids: Vec<u64> = state.positions.iter().map(|p| p.id).collect();
    let mut outcome = TickOutcome::default();

    for id in ids {
        let Some(idx) = state.positions.iter().position(|p| p.id == id) else {
            continue;
        };
        // A coin missing from the table must never abort the scan.
        let Some(mark) = state.coins.get(&state.positions[idx].coin).map(|c| c.price) else {
            continue;
        };
        state.positions[idx].current_price = mark;

        match check_trigger(&state.positions[idx], mark) {
            None => {}
            Some(Trigger::Liquidation) => {
                if let Some(record) = state.liquidate(id, now) {
                    tracing::info!(
                        position_id = id,
                        coin = %record.coin,
                        mark,
                        pnl = record.pnl,
                        policy = ?state.liquidation_policy,
                        "Position liquidated"
                    );
                    outcome.closed.push(record);
                    outcome.liquidated = true;
                }
                if state.positions.is_empty() {
                    break;
                }
            }
            Some(Trigger::StopLoss) => {
                if let Some((record, pnl)) = state.close_internal(id, TradeAction::StopLoss, now)
                {
                    debug_assert!(
                        pnl >= -(record.amount * record.leverage as f64) - 1e-9,
                        "stop-loss close lost more than the posted margin"
                    );
                    tracing::info!(
                        position_id = id,
                        coin = %record.coin,
                        mark,
                        pnl,
                        "Stop-loss hit"
                    );
                    outcome.closed.push(record);
                }
            }
            Some(Trigger::TakeProfit) => {
                if let Some((record, pnl)) = state.close_internal(id, TradeAction::TakeProfit, now)
                {
                    debug_assert!(
                        pnl >= -(record.amount * record.leverage as f64) - 1e-9,
                        "take-profit close lost more than the posted margin"
                    );
                    tracing::info!(
                        position_id = id,
                        coin = %record.coin,
                        mark,
                        pnl,
                        "Take-profit hit"
                    );
                    outcome.closed.push(record);
                }
            }
        }
    }

    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::state::{GameState, DEFAULT_BALANCE};
    use crate::models::Side;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_with_policy(policy: LiquidationPolicy) -> GameState {
        GameState::new(policy, StdRng::seed_from_u64(42), Utc::now())
    }

    fn pin(state: &mut GameState, coin: &str, price: f64) {
        state.coins.get_mut(coin).unwrap().price = price;
    }

    fn open_long(state: &mut GameState, amount: f64) -> u64 {
        state
            .open_position(Side::Long, amount, Utc::now())
            .unwrap()
            .id
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(
            "wipe".parse::<LiquidationPolicy>().unwrap(),
            LiquidationPolicy::WipeAccount
        );
        assert_eq!(
            "single_at_fault".parse::<LiquidationPolicy>().unwrap(),
            LiquidationPolicy::SingleAtFault
        );
        assert!("everything".parse::<LiquidationPolicy>().is_err());
    }

    #[test]
    fn trigger_priority_prefers_liquidation() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        let id = open_long(&mut state, 100.0);
        let position = state.positions[0].clone();

        // A deep crash matches both liquidation and stop-loss; liquidation
        // must win.
        assert_eq!(check_trigger(&position, 0.5), Some(Trigger::Liquidation));
        assert_eq!(check_trigger(&position, 0.8), Some(Trigger::Liquidation));
        assert_eq!(check_trigger(&position, 0.9), Some(Trigger::StopLoss));
        assert_eq!(check_trigger(&position, 0.95), Some(Trigger::StopLoss));
        assert_eq!(check_trigger(&position, 1.0), None);
        assert_eq!(check_trigger(&position, 1.1), Some(Trigger::TakeProfit));

        // The evaluator path agrees.
        pin(&mut state, "SHIBA", 0.5);
        let outcome = evaluate(&mut state, Utc::now());
        assert!(outcome.liquidated);
        assert_eq!(outcome.closed.len(), 1);
        assert_eq!(outcome.closed[0].action, TradeAction::Liquidated);
        assert_eq!(outcome.closed[0].id, id);
    }

    #[test]
    fn short_triggers_mirror_long() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        state
            .open_position(Side::Short, 100.0, Utc::now())
            .unwrap();
        let position = state.positions[0].clone();

        assert_eq!(check_trigger(&position, 1.2), Some(Trigger::Liquidation));
        assert_eq!(check_trigger(&position, 1.05), Some(Trigger::StopLoss));
        assert_eq!(check_trigger(&position, 0.9), Some(Trigger::TakeProfit));
        assert_eq!(check_trigger(&position, 1.0), None);
    }

    #[test]
    fn exact_threshold_touch_fires() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        open_long(&mut state, 100.0);

        pin(&mut state, "SHIBA", 0.95);
        let outcome = evaluate(&mut state, Utc::now());
        assert_eq!(outcome.closed[0].action, TradeAction::StopLoss);
    }

    #[test]
    fn wipe_liquidation_zeroes_balance_and_clears_all_positions() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        let at_fault = open_long(&mut state, 100.0);
        // Second position on another coin, far from any threshold.
        state.set_current_coin("PEPE").unwrap();
        pin(&mut state, "PEPE", 1.0);
        state.open_position(Side::Long, 10.0, Utc::now()).unwrap();

        pin(&mut state, "SHIBA", 0.8);
        let outcome = evaluate(&mut state, Utc::now());

        assert!(outcome.liquidated);
        assert_eq!(outcome.closed.len(), 1, "scan short-circuits after wipe");
        assert_eq!(state.balance, 0.0);
        assert!(state.positions.is_empty());
        assert_eq!(state.history[0].action, TradeAction::Liquidated);
        assert_eq!(state.history[0].id, at_fault);
        assert_eq!(state.history[0].pnl, -500.0);
    }

    #[test]
    fn single_at_fault_keeps_other_positions_running() {
        let mut state = state_with_policy(LiquidationPolicy::SingleAtFault);
        pin(&mut state, "SHIBA", 1.0);
        open_long(&mut state, 100.0);
        state.set_current_coin("PEPE").unwrap();
        pin(&mut state, "PEPE", 1.0);
        let survivor = state
            .open_position(Side::Long, 10.0, Utc::now())
            .unwrap()
            .id;
        let balance_after_opens = state.balance;

        pin(&mut state, "SHIBA", 0.8);
        let outcome = evaluate(&mut state, Utc::now());

        assert!(outcome.liquidated);
        assert_eq!(state.positions.len(), 1);
        assert_eq!(state.positions[0].id, survivor);
        // margin is forfeited, nothing returned, nothing else touched
        assert_eq!(state.balance, balance_after_opens);
    }

    #[test]
    fn mark_price_refreshes_even_without_trigger() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        open_long(&mut state, 100.0);

        pin(&mut state, "SHIBA", 1.02);
        let outcome = evaluate(&mut state, Utc::now());
        assert!(outcome.is_quiet());
        assert_eq!(state.positions[0].current_price, 1.02);
    }

    #[test]
    fn take_profit_scenario_matches_ledger_math() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        open_long(&mut state, 100.0);
        assert_eq!(state.balance, DEFAULT_BALANCE - 500.0);

        pin(&mut state, "SHIBA", 1.1);
        let outcome = evaluate(&mut state, Utc::now());
        assert_eq!(outcome.closed[0].action, TradeAction::TakeProfit);
        assert!((outcome.closed[0].pnl - 50.0).abs() < 1e-9);
        assert!((state.balance - 1050.0).abs() < 1e-9);
    }

    #[test]
    fn history_entries_stay_immutable_across_ticks() {
        let mut state = state_with_policy(LiquidationPolicy::WipeAccount);
        pin(&mut state, "SHIBA", 1.0);
        let id = open_long(&mut state, 100.0);
        pin(&mut state, "SHIBA", 1.1);
        evaluate(&mut state, Utc::now());

        let frozen = state.history[0].clone();
        pin(&mut state, "SHIBA", 0.5);
        evaluate(&mut state, Utc::now());
        state.close_position(id, Utc::now());

        assert_eq!(state.history.iter().filter(|t| t.id == id).count(), 2);
        let reread = state
            .history
            .iter()
            .find(|t| t.id == id && t.action == TradeAction::TakeProfit)
            .unwrap();
        assert_eq!(reread.pnl, frozen.pnl);
        assert_eq!(reread.exit_price, frozen.exit_price);
    }
}

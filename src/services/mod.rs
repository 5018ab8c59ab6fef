pub mod event_scheduler;
pub mod notifier;
pub mod price_ticker;

pub use notifier::Notifier;

use std::sync::Arc;

use chrono::Utc;
use metrics::{counter, gauge};
use tokio::sync::broadcast;

use crate::api::ws_types::{CoinTick, LiquidationNotice, OpenPositionView, WsMessage};
use crate::engine::{Game, TickOutcome};
use crate::models::TradeAction;
use crate::store::SnapshotStore;

/// Push the full market picture (prices + open positions) to WS clients.
/// Send errors just mean nobody is listening.
pub(crate) async fn publish_market(game: &Game, ws_tx: &broadcast::Sender<WsMessage>) {
    let now = Utc::now().timestamp();
    let ticks: Vec<CoinTick> = game
        .coins()
        .await
        .iter()
        .map(|c| CoinTick {
            name: c.name.clone(),
            price: c.price,
            trend: c.trend,
            volume: c.volume,
            time: c.history.last().map(|p| p.time).unwrap_or(now),
        })
        .collect();
    let _ = ws_tx.send(WsMessage::PriceUpdate(ticks));

    let views: Vec<OpenPositionView> = game
        .positions_with_pnl()
        .await
        .into_iter()
        .map(|(position, unrealized_pnl)| OpenPositionView {
            position,
            unrealized_pnl,
        })
        .collect();
    let _ = ws_tx.send(WsMessage::PositionsUpdate(views));
}

/// Fan out evaluator closures to WS clients and Telegram, and refresh the
/// account gauges.
pub(crate) async fn publish_closures(
    game: &Game,
    ws_tx: &broadcast::Sender<WsMessage>,
    notifier: &Option<Arc<Notifier>>,
    outcome: &TickOutcome,
) {
    for record in &outcome.closed {
        counter!("positions_closed_total").increment(1);
        match record.action {
            TradeAction::Liquidated => {
                counter!("liquidations_total").increment(1);
                let balance = game.summary().await.balance;
                let _ = ws_tx.send(WsMessage::Liquidation(LiquidationNotice {
                    position_id: record.id,
                    coin: record.coin.clone(),
                    lost_margin: -record.pnl,
                    balance,
                }));
                if let Some(n) = notifier {
                    n.send(&notifier::format_liquidation(record, balance)).await;
                }
            }
            _ => {
                let _ = ws_tx.send(WsMessage::TradeExecuted(record.clone()));
                if let Some(n) = notifier {
                    n.send(&notifier::format_auto_close(record)).await;
                }
            }
        }
    }

    let summary = game.summary().await;
    gauge!("balance").set(summary.balance);
    gauge!("open_positions").set(summary.open_positions as f64);
    gauge!("total_pnl").set(summary.total_pnl);
}

/// Write the snapshot; persistence failures never interrupt the game.
pub(crate) async fn persist(game: &Game, store: &SnapshotStore) {
    let snapshot = game.snapshot().await;
    if let Err(e) = store.save(&snapshot) {
        counter!("snapshot_errors_total").increment(1);
        tracing::error!(error = %e, path = %store.path().display(), "Failed to save snapshot");
    }
}

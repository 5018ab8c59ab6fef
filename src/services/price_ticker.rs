use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::ws_types::WsMessage;
use crate::engine::Game;
use crate::services::{persist, publish_closures, publish_market, Notifier};
use crate::store::SnapshotStore;

/// Run the simulation heartbeat. Every interval: advance all coin prices,
/// evaluate open positions, persist the snapshot and broadcast the new
/// market picture.
///
/// A slow iteration delays the next tick instead of overlapping it, so
/// ticks never run concurrently.
pub async fn run_price_ticker(
    game: Game,
    store: Arc<SnapshotStore>,
    ws_tx: broadcast::Sender<WsMessage>,
    pause_flag: Arc<AtomicBool>,
    interval_secs: u64,
    notifier: Option<Arc<Notifier>>,
) {
    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        // Respect pause flag
        if pause_flag.load(Ordering::Relaxed) {
            tracing::debug!("Price ticker paused");
            continue;
        }

        let outcome = game.advance_tick().await;
        counter!("ticks_total").increment(1);

        if !outcome.is_quiet() {
            tracing::info!(
                closed = outcome.closed.len(),
                liquidated = outcome.liquidated,
                "Tick closed positions"
            );
        }

        publish_market(&game, &ws_tx).await;
        publish_closures(&game, &ws_tx, &notifier, &outcome).await;
        persist(&game, &store).await;
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use metrics::counter;
use tokio::sync::broadcast;
use tokio::time::{interval, sleep, Duration, MissedTickBehavior};

use crate::api::ws_types::WsMessage;
use crate::engine::Game;
use crate::services::{persist, publish_closures, publish_market, notifier, Notifier};
use crate::store::SnapshotStore;

/// Run the scripted market-event scheduler: one early fire after a short
/// warm-up so a fresh session sees action quickly, then one event per
/// fixed period.
pub async fn run_event_scheduler(
    game: Game,
    store: Arc<SnapshotStore>,
    ws_tx: broadcast::Sender<WsMessage>,
    pause_flag: Arc<AtomicBool>,
    warmup_secs: u64,
    interval_secs: u64,
    notifier: Option<Arc<Notifier>>,
) {
    sleep(Duration::from_secs(warmup_secs)).await;
    fire_once(&game, &store, &ws_tx, &pause_flag, &notifier).await;

    let mut ticker = interval(Duration::from_secs(interval_secs.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await; // consume the immediate tick; next fires after a full period

    loop {
        ticker.tick().await;
        fire_once(&game, &store, &ws_tx, &pause_flag, &notifier).await;
    }
}

async fn fire_once(
    game: &Game,
    store: &SnapshotStore,
    ws_tx: &broadcast::Sender<WsMessage>,
    pause_flag: &AtomicBool,
    telegram: &Option<Arc<Notifier>>,
) {
    if pause_flag.load(Ordering::Relaxed) {
        tracing::debug!("Event scheduler paused");
        return;
    }

    // None only when the coin table is empty; nothing to do then.
    let Some((event, outcome)) = game.fire_next_event().await else {
        tracing::debug!("No coins to target, skipping market event");
        return;
    };

    counter!("events_fired_total").increment(1);
    tracing::info!(
        coin = %event.coin,
        impact_pct = event.impact * 100.0,
        headline = %event.headline,
        "Market event fired"
    );

    let _ = ws_tx.send(WsMessage::MarketEvent(event.clone()));
    if let Some(n) = telegram {
        n.send(&notifier::format_market_event(&event)).await;
    }

    publish_market(game, ws_tx).await;
    publish_closures(game, ws_tx, telegram, &outcome).await;
    persist(game, store).await;
}

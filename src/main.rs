use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::broadcast;

use memedex::api::router::create_router;
use memedex::api::ws_types::WsMessage;
use memedex::config::AppConfig;
use memedex::engine::{Game, GameState};
use memedex::services::event_scheduler::run_event_scheduler;
use memedex::services::price_ticker::run_price_ticker;
use memedex::services::Notifier;
use memedex::store::SnapshotStore;
use memedex::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    let metrics_handle = memedex::metrics::init_metrics();

    // --- Game state: restore the previous session or start fresh ---
    let store = Arc::new(SnapshotStore::new(config.snapshot_path.clone()));
    let snapshot = store.load();
    let game_state = GameState::from_snapshot(
        snapshot,
        config.liquidation_policy,
        StdRng::from_entropy(),
        chrono::Utc::now(),
    );
    let game = Game::new(game_state);
    tracing::info!(path = %config.snapshot_path, "Game state ready");

    // --- WebSocket broadcast channel for clients ---
    let (ws_tx, _) = broadcast::channel::<WsMessage>(256);

    // --- Telegram notifier (optional) ---
    let notifier = if config.has_telegram() {
        tracing::info!("Telegram notifications enabled");
        Some(Arc::new(Notifier::new(
            config.telegram_bot_token.clone().unwrap(),
            config.telegram_chat_id.clone().unwrap(),
        )))
    } else {
        tracing::info!("Telegram notifications disabled");
        None
    };

    let pause_flag = Arc::new(AtomicBool::new(false));

    // --- Simulation loops: price ticker + scripted event scheduler ---
    {
        let game = game.clone();
        let store = Arc::clone(&store);
        let ws_tx = ws_tx.clone();
        let pause_flag = Arc::clone(&pause_flag);
        let notifier = notifier.clone();
        let interval = config.tick_interval_secs;
        tokio::spawn(async move {
            run_price_ticker(game, store, ws_tx, pause_flag, interval, notifier).await;
        });
    }
    {
        let game = game.clone();
        let store = Arc::clone(&store);
        let ws_tx = ws_tx.clone();
        let pause_flag = Arc::clone(&pause_flag);
        let notifier = notifier.clone();
        let warmup = config.event_warmup_secs;
        let interval = config.event_interval_secs;
        tokio::spawn(async move {
            run_event_scheduler(game, store, ws_tx, pause_flag, warmup, interval, notifier).await;
        });
    }
    tracing::info!(
        tick_secs = config.tick_interval_secs,
        event_secs = config.event_interval_secs,
        "Simulation loops spawned"
    );

    let state = AppState {
        game,
        config,
        store,
        ws_tx,
        metrics_handle,
        notifier,
        pause_flag,
        started_at: Instant::now(),
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}

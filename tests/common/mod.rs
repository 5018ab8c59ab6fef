use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use chrono::Utc;
use metrics_exporter_prometheus::PrometheusHandle;
use rand::rngs::StdRng;
use rand::SeedableRng;

use memedex::api::ws_types::WsMessage;
use memedex::config::AppConfig;
use memedex::engine::{Game, GameState, LiquidationPolicy};
use memedex::store::SnapshotStore;
use memedex::AppState;

/// The Prometheus recorder is global to the process; install it once and
/// hand out clones.
static METRICS: OnceLock<PrometheusHandle> = OnceLock::new();

fn metrics_handle() -> PrometheusHandle {
    METRICS.get_or_init(memedex::metrics::init_metrics).clone()
}

static SNAPSHOT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Per-test snapshot path under the OS temp dir.
#[allow(dead_code)]
pub fn temp_snapshot_path(tag: &str) -> String {
    let seq = SNAPSHOT_SEQ.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir()
        .join(format!("memedex_{tag}_{}_{seq}.json", std::process::id()))
        .to_string_lossy()
        .into_owned()
}

/// Scrubs the auth env once per test binary so the protected routes are
/// open. Tests issue requests only after their builder returned, so the
/// env is stable for the binary's whole run.
static OPEN_ENV: OnceLock<()> = OnceLock::new();

/// A deterministic app state with a seeded market, no background loops
/// and authentication disabled.
#[allow(dead_code)]
pub fn build_test_state() -> AppState {
    OPEN_ENV.get_or_init(|| {
        std::env::remove_var("API_TOKEN");
        std::env::remove_var("TELEGRAM_BOT_TOKEN");
    });
    build_state_raw()
}

/// Same app state without touching the auth env; the auth tests manage
/// `API_TOKEN` themselves.
#[allow(dead_code)]
pub fn build_state_raw() -> AppState {
    let (ws_tx, _) = tokio::sync::broadcast::channel::<WsMessage>(16);
    let snapshot_path = temp_snapshot_path("api");

    let config = AppConfig {
        host: "127.0.0.1".into(),
        port: 0,
        tick_interval_secs: 5,
        event_interval_secs: 90,
        event_warmup_secs: 30,
        liquidation_policy: LiquidationPolicy::WipeAccount,
        snapshot_path: snapshot_path.clone(),
        telegram_bot_token: None,
        telegram_chat_id: None,
        notifications_enabled: false,
    };

    let game = Game::new(GameState::new(
        LiquidationPolicy::WipeAccount,
        StdRng::seed_from_u64(42),
        Utc::now(),
    ));

    AppState {
        game,
        config,
        store: Arc::new(SnapshotStore::new(snapshot_path)),
        ws_tx,
        metrics_handle: metrics_handle(),
        notifier: None,
        pause_flag: Arc::new(AtomicBool::new(false)),
        started_at: Instant::now(),
    }
}

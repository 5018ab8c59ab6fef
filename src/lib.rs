pub mod api;
pub mod config;
pub mod engine;
pub mod errors;
pub mod market;
pub mod metrics;
pub mod models;
pub mod services;
pub mod store;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::broadcast;

use crate::api::ws_types::WsMessage;
use crate::config::AppConfig;
use crate::engine::Game;
use crate::services::Notifier;
use crate::store::SnapshotStore;

#[derive(Clone)]
pub struct AppState {
    pub game: Game,
    pub config: AppConfig,
    pub store: Arc<SnapshotStore>,
    pub ws_tx: broadcast::Sender<WsMessage>,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
    pub notifier: Option<Arc<Notifier>>,
    pub pause_flag: Arc<AtomicBool>,
    pub started_at: Instant,
}

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Position, TradeRecord};

fn default_balance() -> f64 {
    1000.0
}
fn default_leverage() -> u32 {
    5
}
fn default_stop_loss() -> f64 {
    5.0
}
fn default_take_profit() -> f64 {
    10.0
}
fn default_coin() -> String {
    "SHIBA".to_string()
}

/// Persisted per-coin market state. Charts are not persisted; they are
/// re-seeded on load and pinned to this spot price.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CoinState {
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub volume: f64,
    #[serde(default)]
    pub trend: f64,
}

/// On-disk shape of a saved game. Every field is individually defaulted so
/// a snapshot written by an older build still loads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default = "default_balance")]
    pub balance: f64,
    #[serde(default)]
    pub positions: Vec<Position>,
    #[serde(default)]
    pub history: Vec<TradeRecord>,
    #[serde(default = "default_coin")]
    pub current_coin: String,
    #[serde(default = "default_leverage")]
    pub leverage: u32,
    #[serde(default = "default_stop_loss")]
    pub stop_loss_pct: f64,
    #[serde(default = "default_take_profit")]
    pub take_profit_pct: f64,
    #[serde(default)]
    pub coins: HashMap<String, CoinState>,
    #[serde(default)]
    pub next_position_id: u64,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl GameSnapshot {
    /// Only this many newest trades are written to disk; the in-memory
    /// history is unbounded for the session.
    pub const HISTORY_CAP: usize = 50;
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            balance: default_balance(),
            positions: Vec::new(),
            history: Vec::new(),
            current_coin: default_coin(),
            leverage: default_leverage(),
            stop_loss_pct: default_stop_loss(),
            take_profit_pct: default_take_profit(),
            coins: HashMap::new(),
            next_position_id: 0,
            saved_at: None,
        }
    }
}

/// JSON file persistence for the game snapshot.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the saved game. A missing file starts fresh; a malformed one
    /// is logged and also starts fresh. Never an error for the caller.
    pub fn load(&self) -> GameSnapshot {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No snapshot found, starting fresh");
                return GameSnapshot::default();
            }
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Snapshot unreadable, starting fresh");
                return GameSnapshot::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "Snapshot corrupt, starting fresh");
                GameSnapshot::default()
            }
        }
    }

    /// Writes via a sibling temp file and rename so a crash mid-write
    /// cannot leave a half-written snapshot behind.
    pub fn save(&self, snapshot: &GameSnapshot) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), "Snapshot saved");
        Ok(())
    }
}

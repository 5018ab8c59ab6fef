use std::env;

use crate::engine::LiquidationPolicy;

const DEFAULT_SNAPSHOT_PATH: &str = "memedex_state.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,

    // Simulation cadence
    pub tick_interval_secs: u64,
    pub event_interval_secs: u64,
    pub event_warmup_secs: u64,
    pub liquidation_policy: LiquidationPolicy,

    // Persistence
    pub snapshot_path: String,

    // Telegram notifications (optional — both required to enable)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub notifications_enabled: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            tick_interval_secs: env::var("TICK_INTERVAL_SECS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(5),
            event_interval_secs: env::var("EVENT_INTERVAL_SECS")
                .unwrap_or_else(|_| "90".into())
                .parse()
                .unwrap_or(90),
            event_warmup_secs: env::var("EVENT_WARMUP_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),
            liquidation_policy: env::var("LIQUIDATION_POLICY")
                .unwrap_or_default()
                .parse()
                .unwrap_or_default(),

            snapshot_path: env::var("SNAPSHOT_PATH")
                .unwrap_or_else(|_| DEFAULT_SNAPSHOT_PATH.into()),

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN").ok().filter(|s| !s.is_empty()),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID").ok().filter(|s| !s.is_empty()),
            notifications_enabled: env::var("NOTIFICATIONS_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
        })
    }

    /// Returns true when Telegram pushes are configured and switched on.
    pub fn has_telegram(&self) -> bool {
        self.notifications_enabled
            && self.telegram_bot_token.is_some()
            && self.telegram_chat_id.is_some()
    }
}

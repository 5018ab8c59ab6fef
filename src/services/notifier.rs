use serde_json::json;

use crate::models::{MarketEvent, TradeRecord};

/// Telegram notification service. Failures are logged but never block the main flow.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(bot_token: String, chat_id: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            bot_token,
            chat_id,
        }
    }

    /// Send a Telegram message. Failures are logged as warnings.
    pub async fn send(&self, message: &str) {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
            "parse_mode": "Markdown",
        });

        match self.http.post(&url).json(&body).send().await {
            Ok(resp) => {
                if !resp.status().is_success() {
                    tracing::warn!(
                        status = %resp.status(),
                        "Telegram sendMessage returned non-2xx"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to send Telegram notification");
            }
        }
    }
}

/// Format a fired market event.
pub fn format_market_event(event: &MarketEvent) -> String {
    let mood = if event.impact >= 0.0 { "📈" } else { "📉" };
    format!(
        "{mood} *Market Event*\n{}\n{} moves {:+.2}%",
        event.headline,
        event.coin,
        event.impact * 100.0,
    )
}

/// Format a liquidation alert.
pub fn format_liquidation(record: &TradeRecord, balance_after: f64) -> String {
    format!(
        "💀 *Liquidated*\n{} {} x{} at {:.8}\nMargin lost: ${:.2}\nBalance: ${:.2}",
        record.coin,
        record.side,
        record.leverage,
        record.exit_price.unwrap_or(record.entry_price),
        -record.pnl,
        balance_after,
    )
}

/// Format an automatic stop-loss/take-profit exit.
pub fn format_auto_close(record: &TradeRecord) -> String {
    format!(
        "*{}*\n{} {} x{}\nEntry {:.8} → Exit {:.8}\nP&L: ${:+.2}",
        record.action,
        record.coin,
        record.side,
        record.leverage,
        record.entry_price,
        record.exit_price.unwrap_or(record.entry_price),
        record.pnl,
    )
}

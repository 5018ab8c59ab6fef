use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether an event pushes the price up or down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventKind {
    Positive,
    Negative,
}

impl EventKind {
    pub fn direction(&self) -> f64 {
        match self {
            EventKind::Positive => 1.0,
            EventKind::Negative => -1.0,
        }
    }
}

/// A scripted one-shot price shock applied to a single coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEvent {
    pub kind: EventKind,
    pub headline: String,
    /// Signed fractional price change, e.g. 0.021 for +2.1%.
    pub impact: f64,
    pub coin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fired_at: Option<DateTime<Utc>>,
}

impl fmt::Display for MarketEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:+.2}% {}",
            self.coin,
            self.impact * 100.0,
            self.headline
        )
    }
}

use serde::{Deserialize, Serialize};

/// Static catalog entry for a tradeable coin: starting price and the band
/// the simulated price is kept inside.
#[derive(Debug, Clone, Copy)]
pub struct CoinProfile {
    pub name: &'static str,
    pub start_price: f64,
    pub min_price: f64,
    pub max_price: f64,
}

/// The built-in coin catalog.
pub const COIN_CATALOG: &[CoinProfile] = &[
    CoinProfile {
        name: "SHIBA",
        start_price: 0.000008,
        min_price: 0.000005,
        max_price: 0.000012,
    },
    CoinProfile {
        name: "PEPE",
        start_price: 0.0000012,
        min_price: 0.0000008,
        max_price: 0.0000018,
    },
    CoinProfile {
        name: "BONK",
        start_price: 0.000015,
        min_price: 0.000010,
        max_price: 0.000022,
    },
];

/// One chart sample. `time` is unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: i64,
    pub value: f64,
}

/// Live state of a simulated coin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coin {
    pub name: String,
    pub price: f64,
    pub min_price: f64,
    pub max_price: f64,
    /// Short-term directional momentum in [-1, 1].
    pub trend: f64,
    /// Accumulated notional traded on this coin; decays every tick.
    pub volume: f64,
    pub history: Vec<PricePoint>,
}

impl Coin {
    pub fn from_profile(profile: &CoinProfile) -> Self {
        Self {
            name: profile.name.to_string(),
            price: profile.start_price,
            min_price: profile.min_price,
            max_price: profile.max_price,
            trend: 0.0,
            volume: 0.0,
            history: Vec::new(),
        }
    }

    /// Appends a sample and evicts the oldest entries beyond `cap`.
    pub fn push_sample(&mut self, point: PricePoint, cap: usize) {
        self.history.push(point);
        if self.history.len() > cap {
            let excess = self.history.len() - cap;
            self.history.drain(..excess);
        }
    }

    pub fn last_price(&self) -> f64 {
        self.history.last().map(|p| p.value).unwrap_or(self.price)
    }
}

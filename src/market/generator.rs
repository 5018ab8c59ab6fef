use chrono::{DateTime, Duration, Timelike, Utc};
use rand::Rng;

use crate::models::{Coin, CoinProfile, PricePoint};

/// Maximum chart samples kept per coin; oldest evicted first.
pub const HISTORY_CAP: usize = 500;
/// Backward-walk window used to seed a fresh chart.
pub const SEED_STEPS: usize = 200;
pub const SEED_STEP_SECS: i64 = 60;

const SEED_VOLATILITY: f64 = 0.001;
const TICK_VOLATILITY: f64 = 0.0002;
const SEED_CLAMP_JITTER: f64 = 0.1;
const TICK_CLAMP_JITTER: f64 = 0.05;
/// Trend bias relative to the noise amplitude of a single tick.
const TREND_WEIGHT: f64 = 0.5;
const TREND_DECAY: f64 = 0.92;
const VOLUME_DECAY: f64 = 0.97;

// ---------------------------------------------------------------------------
// History seeding
// ---------------------------------------------------------------------------

/// Walks backward from `now` and produces the initial chart for a coin.
///
/// Samples may transiently leave the live band by up to 10% (the seed walk
/// clamps against a looser window); the walk's final value is what the live
/// price is initialized to, strictly clamped into `[min, max]`.
pub fn seed_history(
    profile: &CoinProfile,
    now: DateTime<Utc>,
    rng: &mut impl Rng,
) -> Vec<PricePoint> {
    let mut history = Vec::with_capacity(SEED_STEPS + 1);
    let mut price = profile.start_price;
    let loose_min = profile.min_price * 0.9;
    let loose_max = profile.max_price * 1.1;

    for i in (0..=SEED_STEPS).rev() {
        let time = now - Duration::seconds(i as i64 * SEED_STEP_SECS);
        let change = (rng.gen::<f64>() - 0.5) * SEED_VOLATILITY * price;
        price += change;
        price = soft_clamp(price, loose_min, loose_max, SEED_CLAMP_JITTER, rng);
        history.push(PricePoint {
            time: time.timestamp(),
            value: price,
        });
    }

    history
}

/// Builds the live coin from its catalog profile: seeded chart plus a spot
/// price taken from the walk's final sample.
pub fn init_coin(profile: &CoinProfile, now: DateTime<Utc>, rng: &mut impl Rng) -> Coin {
    let mut coin = Coin::from_profile(profile);
    coin.history = seed_history(profile, now, rng);
    coin.price = coin
        .last_price()
        .clamp(profile.min_price, profile.max_price);
    coin
}

// ---------------------------------------------------------------------------
// Live tick
// ---------------------------------------------------------------------------

/// Advances one coin by one tick. Returns the new price.
///
/// The step is `last × volatility × session × (rand − 0.5)` plus a small
/// bias in the direction of the coin's trend; the result is soft-clamped
/// into the band and appended to the chart. Trend and volume decay toward
/// zero on every tick.
pub fn advance(coin: &mut Coin, now: DateTime<Utc>, rng: &mut impl Rng) -> f64 {
    let last = coin.last_price();
    let session = session_factor(now.hour());
    let noise = last * TICK_VOLATILITY * session * (rng.gen::<f64>() - 0.5);
    let bias = last * TICK_VOLATILITY * session * TREND_WEIGHT * coin.trend;

    let mut price = last + noise + bias;
    price = soft_clamp(price, coin.min_price, coin.max_price, TICK_CLAMP_JITTER, rng);

    coin.price = price;
    coin.push_sample(
        PricePoint {
            time: now.timestamp(),
            value: price,
        },
        HISTORY_CAP,
    );
    coin.trend *= TREND_DECAY;
    coin.volume *= VOLUME_DECAY;

    price
}

/// Applies a scripted event's shock: the price jumps by the fractional
/// `impact`, is soft-clamped back into the band, and the coin's trend
/// snaps to the shock's direction.
pub fn apply_shock(coin: &mut Coin, impact: f64, now: DateTime<Utc>, rng: &mut impl Rng) -> f64 {
    let mut price = coin.price * (1.0 + impact);
    price = soft_clamp(price, coin.min_price, coin.max_price, TICK_CLAMP_JITTER, rng);

    coin.price = price;
    coin.push_sample(
        PricePoint {
            time: now.timestamp(),
            value: price,
        },
        HISTORY_CAP,
    );
    coin.trend = impact.signum();

    price
}

/// Activity multiplier by wall-clock hour: busiest mid-day, quietest at
/// night.
pub fn session_factor(hour: u32) -> f64 {
    match hour {
        0..=5 => 0.6,
        6..=8 => 0.9,
        9..=16 => 1.3,
        17..=21 => 1.0,
        _ => 0.7,
    }
}

/// Re-clamps a breached price a small randomized margin inside the rail so
/// it never sticks exactly at the boundary.
fn soft_clamp(price: f64, min: f64, max: f64, jitter: f64, rng: &mut impl Rng) -> f64 {
    if price < min {
        min * (1.0 + rng.gen::<f64>() * jitter)
    } else if price > max {
        max * (1.0 - rng.gen::<f64>() * jitter)
    } else {
        price
    }
}

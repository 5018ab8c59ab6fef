use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;

use crate::models::{EventKind, MarketEvent};

/// Events per polarity in one generated batch.
pub const EVENTS_PER_POLARITY: usize = 15;
/// Base fractional price shock of a fired event.
pub const BASE_IMPACT: f64 = 0.02;
/// Jitter added to the base impact, uniform in `[-JITTER, JITTER]`.
pub const IMPACT_JITTER: f64 = 0.005;

const POSITIVE_HEADLINES: [&str; EVENTS_PER_POLARITY] = [
    "Major exchange announces listing",
    "Whale wallet spotted accumulating",
    "Viral TikTok sends holders into overdrive",
    "Celebrity tweets a rocket emoji",
    "Token burn proposal passes community vote",
    "Partnership rumor with payment giant",
    "Top influencer calls it the next 100x",
    "Staking program launch announced",
    "Trending #1 on crypto Twitter",
    "Market maker adds deep liquidity",
    "New meme template goes viral",
    "Community AMA exceeds expectations",
    "Funding flips positive, shorts squeezed",
    "Mobile wallet integration ships",
    "Late-night talk show mentions the coin",
];

const NEGATIVE_HEADLINES: [&str; EVENTS_PER_POLARITY] = [
    "Exchange flags deployer wallet for review",
    "Early investor dumps entire bag",
    "Rug-pull rumors swirl on Telegram",
    "Regulator opens inquiry into meme tokens",
    "Bridge exploit drains a liquidity pool",
    "Lead dev goes silent, community panics",
    "Viral thread questions the tokenomics",
    "Exchange delists low-volume pairs",
    "Whale moves entire stack to an exchange",
    "Audit publishes critical findings",
    "Copycat token confuses new buyers",
    "Stablecoin wobble drags alts down",
    "Gas spike freezes retail trading",
    "Influencer quietly deletes every mention",
    "Funding flips deeply negative",
];

/// Shuffled FIFO queue of scripted market events.
///
/// A batch holds an equal number of positive and negative events, each
/// targeting a random coin, shuffled into one sequence. The queue starts
/// empty and regenerates itself whenever it runs out.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<MarketEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Pops the next event, regenerating the batch first if the queue is
    /// exhausted. Returns `None` only when there are no coins to target.
    pub fn next_event(&mut self, coins: &[String], rng: &mut impl Rng) -> Option<MarketEvent> {
        if coins.is_empty() {
            return None;
        }
        if self.pending.is_empty() {
            self.regenerate(coins, rng);
        }
        self.pending.pop_front()
    }

    fn regenerate(&mut self, coins: &[String], rng: &mut impl Rng) {
        let mut batch: Vec<MarketEvent> = Vec::with_capacity(EVENTS_PER_POLARITY * 2);
        for headline in POSITIVE_HEADLINES {
            batch.push(build_event(EventKind::Positive, headline, coins, rng));
        }
        for headline in NEGATIVE_HEADLINES {
            batch.push(build_event(EventKind::Negative, headline, coins, rng));
        }
        batch.shuffle(rng);
        self.pending = batch.into();
    }
}

fn build_event(
    kind: EventKind,
    headline: &str,
    coins: &[String],
    rng: &mut impl Rng,
) -> MarketEvent {
    let magnitude = BASE_IMPACT + rng.gen_range(-IMPACT_JITTER..=IMPACT_JITTER);
    let coin = coins
        .choose(rng)
        .cloned()
        .unwrap_or_default();
    MarketEvent {
        kind,
        headline: headline.to_string(),
        impact: kind.direction() * magnitude,
        coin,
        fired_at: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn coin_names() -> Vec<String> {
        vec!["SHIBA".to_string(), "PEPE".to_string(), "BONK".to_string()]
    }

    #[test]
    fn empty_coin_list_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut queue = EventQueue::new();
        assert!(queue.next_event(&[], &mut rng).is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn batch_is_balanced_and_consumed_fifo() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut queue = EventQueue::new();
        let coins = coin_names();

        let mut positive = 0;
        let mut negative = 0;
        for _ in 0..EVENTS_PER_POLARITY * 2 {
            let event = queue.next_event(&coins, &mut rng).unwrap();
            match event.kind {
                EventKind::Positive => positive += 1,
                EventKind::Negative => negative += 1,
            }
        }
        assert_eq!(positive, EVENTS_PER_POLARITY);
        assert_eq!(negative, EVENTS_PER_POLARITY);
        assert!(queue.is_empty(), "batch fully drained");
    }

    #[test]
    fn queue_regenerates_after_exhaustion() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut queue = EventQueue::new();
        let coins = coin_names();

        for _ in 0..EVENTS_PER_POLARITY * 2 {
            queue.next_event(&coins, &mut rng).unwrap();
        }
        assert!(queue.next_event(&coins, &mut rng).is_some());
        assert_eq!(queue.len(), EVENTS_PER_POLARITY * 2 - 1);
    }

    #[test]
    fn impact_sign_matches_kind_and_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut queue = EventQueue::new();
        let coins = coin_names();

        for _ in 0..EVENTS_PER_POLARITY * 4 {
            let event = queue.next_event(&coins, &mut rng).unwrap();
            let magnitude = event.impact.abs();
            assert!(magnitude >= BASE_IMPACT - IMPACT_JITTER);
            assert!(magnitude <= BASE_IMPACT + IMPACT_JITTER);
            match event.kind {
                EventKind::Positive => assert!(event.impact > 0.0),
                EventKind::Negative => assert!(event.impact < 0.0),
            }
            assert!(coins.contains(&event.coin));
        }
    }

    #[test]
    fn shuffle_orders_differ_between_batches() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut queue = EventQueue::new();
        let coins = coin_names();

        let first: Vec<String> = (0..EVENTS_PER_POLARITY * 2)
            .map(|_| queue.next_event(&coins, &mut rng).unwrap().headline)
            .collect();
        let second: Vec<String> = (0..EVENTS_PER_POLARITY * 2)
            .map(|_| queue.next_event(&coins, &mut rng).unwrap().headline)
            .collect();
        assert_ne!(first, second, "independent shuffles");
    }
}

pub mod evaluator;
pub mod game;
pub mod state;

pub use evaluator::{LiquidationPolicy, TickOutcome};
pub use game::{AccountSummary, Game};
pub use state::{GameState, TradeError};

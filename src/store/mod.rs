pub mod snapshot;

pub use snapshot::{CoinState, GameSnapshot, SnapshotStore};

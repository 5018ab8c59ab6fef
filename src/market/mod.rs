pub mod events;
pub mod generator;

pub use events::EventQueue;

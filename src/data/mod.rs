//! Data types and loading utilities

pub mod loader;
pub mod types;

pub use loader::DataLoader;
pub use types::{Competition, FeatureRow, MatchOutcome, MatchRecord, PricePoint, PriceSeries};

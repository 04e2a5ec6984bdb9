//! Feature engineering from match odds

pub mod engineer;

pub use engineer::FeatureEngineer;

//! Statistical analysis of engineered alpha features

pub mod signals;
pub mod stats;

pub use signals::{AlphaSignalReport, DatasetOverview, SignalAnalyzer};

//! # Odds Alpha - Betting Markets as Stock Signals
//!
//! This library searches for alpha signals in the stock of a publicly traded
//! football club by combining historical betting odds with the club's share
//! price history. It covers the full workflow:
//!
//! - Price history fetching from Yahoo Finance
//! - Feature engineering from match odds (implied probabilities, bookmaker
//!   margin, surprise factor, league context)
//! - Signal analysis (correlations, group comparisons, t-tests)
//! - Gradient-boosted regression of the post-surprise correction return

pub mod analysis;
pub mod api;
pub mod config;
pub mod data;
pub mod features;
pub mod models;

pub use analysis::signals::SignalAnalyzer;
pub use api::yahoo::YahooClient;
pub use config::{AppConfig, LeagueRules, SignalConfig};
pub use data::types::{Competition, FeatureRow, MatchOutcome, MatchRecord, PriceSeries};
pub use features::engineer::FeatureEngineer;
pub use models::gbm::GbmRegressor;

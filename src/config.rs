//! Configuration for the alpha mining pipeline
//!
//! All tunable constants live here as explicit structs passed into the
//! components, rather than process-wide state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Top-level pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory holding the raw betting dataset
    pub data_dir: String,
    /// Directory for engineered outputs
    pub results_dir: String,
    /// Yahoo Finance ticker of the listed club
    pub stock_symbol: String,
    /// Club name matched (case-insensitively) against team columns
    pub target_team: String,
    /// First date of price history to fetch
    pub history_start: NaiveDate,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            results_dir: "results".to_string(),
            stock_symbol: "BVB.DE".to_string(),
            target_team: "Dortmund".to_string(),
            history_start: NaiveDate::from_ymd_opt(2005, 1, 1).unwrap(),
        }
    }
}

/// Substring vocabulary for classifying a match's competition from the
/// league name. Matching is case-insensitive and first-match-wins in the
/// order of [`crate::data::types::Competition`] variants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeagueRules {
    /// Markers for the top-flight domestic league
    pub domestic_league: Vec<String>,
    /// Markers that veto a domestic-league match (second division naming)
    pub domestic_exclude: Vec<String>,
    /// Markers for the Champions League
    pub champions_league: Vec<String>,
    /// Markers for the Europa League and its predecessor
    pub europa_league: Vec<String>,
    /// Markers for the domestic cup
    pub domestic_cup: Vec<String>,
    /// Markers for friendlies
    pub friendly: Vec<String>,
}

impl Default for LeagueRules {
    fn default() -> Self {
        Self {
            domestic_league: vec!["bundesliga".to_string()],
            domestic_exclude: vec!["2.".to_string()],
            champions_league: vec!["champions league".to_string()],
            europa_league: vec!["europa league".to_string(), "uefa cup".to_string()],
            domestic_cup: vec!["dfb pokal".to_string()],
            friendly: vec!["friendly".to_string()],
        }
    }
}

/// Thresholds for the signal analysis battery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Win probability above which a match counts as high-confidence
    pub high_prob: f64,
    /// Win probability below which a match counts as low-confidence
    pub low_prob: f64,
    /// Bookmaker margin below which a market counts as low-margin
    pub low_margin: f64,
    /// Bookmaker margin above which a market counts as high-margin
    pub high_margin: f64,
    /// Surprise factor above which a result counts as high-surprise
    pub surprise_threshold: f64,
    /// Both comparison groups must exceed this size for a t-test
    pub min_group_size: usize,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            high_prob: 0.6,
            low_prob: 0.4,
            low_margin: 0.05,
            high_margin: 0.10,
            surprise_threshold: 0.7,
            min_group_size: 5,
        }
    }
}

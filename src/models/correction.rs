//! Correction-return modeling pipeline
//!
//! Filters the feature table to high-surprise matches, derives the
//! day 2-3 correction return as the target, and fits a gradient-boosted
//! regressor on the surprise factor, the day-1 move and the match
//! context flags. Reports hold-out metrics and feature importances.

use super::dataset::Dataset;
use super::gbm::{GbmParams, GbmRegressor, ModelMetrics};
use super::ModelError;
use crate::data::types::FeatureRow;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Feature set used by the correction model, in column order
pub const CORRECTION_FEATURES: [&str; 9] = [
    "surprise_factor",
    "next_day_return",
    "club_home",
    "club_away",
    "is_domestic_league",
    "is_champions_league",
    "is_europa_league",
    "is_domestic_cup",
    "is_friendly",
];

/// Configuration of the correction-return trainer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionModelConfig {
    /// Only matches with surprise factor above this are modeled
    pub surprise_threshold: f64,
    /// Fraction of the sample held out for evaluation
    pub test_fraction: f64,
    /// Seed for the train/test shuffle
    pub seed: u64,
    pub gbm: GbmParams,
}

impl Default for CorrectionModelConfig {
    fn default() -> Self {
        Self {
            surprise_threshold: 0.7,
            test_fraction: 0.25,
            seed: 42,
            gbm: GbmParams::default(),
        }
    }
}

/// Outcome of one training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorrectionModelReport {
    pub n_high_surprise: usize,
    pub n_train: usize,
    pub n_test: usize,
    pub metrics: ModelMetrics,
    /// Importances sorted descending
    pub importances: Vec<(String, f64)>,
}

impl fmt::Display for CorrectionModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "High-surprise sample: {} matches", self.n_high_surprise)?;
        writeln!(f, "Train n = {}, Test n = {}", self.n_train, self.n_test)?;
        writeln!(f, "\nHold-out metrics:")?;
        writeln!(f, "  RMSE = {:.4}", self.metrics.rmse)?;
        writeln!(f, "  R^2  = {:.3}", self.metrics.r2)?;
        writeln!(
            f,
            "  Sign agreement = {:.1}%",
            self.metrics.sign_agreement * 100.0
        )?;
        writeln!(f, "\nFeature importances:")?;
        for (name, importance) in &self.importances {
            writeln!(f, "  {:22}: {:.3}", name, importance)?;
        }
        Ok(())
    }
}

/// Build the modeling dataset from high-surprise feature rows.
///
/// Rows missing the surprise factor or the correction target are dropped.
pub fn build_dataset(rows: &[FeatureRow], surprise_threshold: f64) -> Result<Dataset, ModelError> {
    let mut features = Vec::new();
    let mut targets = Vec::new();

    for row in rows {
        let (Some(surprise), Some(correction)) = (row.surprise_factor, row.correction_return())
        else {
            continue;
        };
        if surprise <= surprise_threshold {
            continue;
        }
        features.push(vec![
            surprise,
            row.next_day_return,
            row.club_home as u8 as f64,
            row.club_away as u8 as f64,
            row.is_domestic_league as u8 as f64,
            row.is_champions_league as u8 as f64,
            row.is_europa_league as u8 as f64,
            row.is_domestic_cup as u8 as f64,
            row.is_friendly as u8 as f64,
        ]);
        targets.push(correction);
    }

    Dataset::new(
        features,
        targets,
        CORRECTION_FEATURES.iter().map(|s| s.to_string()).collect(),
    )
}

/// Train the correction model and evaluate it on the hold-out split.
///
/// Hard error when the high-surprise sample is too small to split.
pub fn train_correction_model(
    rows: &[FeatureRow],
    config: &CorrectionModelConfig,
) -> Result<CorrectionModelReport, ModelError> {
    let data = build_dataset(rows, config.surprise_threshold)?;
    if data.n_samples() < 8 {
        return Err(ModelError::InvalidData(format!(
            "only {} high-surprise matches above threshold {}, too few to model",
            data.n_samples(),
            config.surprise_threshold
        )));
    }

    let (train, test) = data.train_test_split(config.test_fraction, config.seed)?;
    info!(
        n_train = train.n_samples(),
        n_test = test.n_samples(),
        "training correction model"
    );

    let mut model = GbmRegressor::new(config.gbm.clone());
    model.fit(&train)?;

    let predictions = model.predict(&test.features)?;
    let metrics = ModelMetrics::regression(&test.targets, &predictions)?;

    let mut importances = model.feature_importances();
    importances.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    Ok(CorrectionModelReport {
        n_high_surprise: data.n_samples(),
        n_train: train.n_samples(),
        n_test: test.n_samples(),
        metrics,
        importances,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(id: i64, surprise: Option<f64>, day1: f64, three_day: f64, won: bool) -> FeatureRow {
        FeatureRow {
            match_id: id,
            match_date: NaiveDate::from_ymd_opt(2020, 1, 4).unwrap(),
            next_trading_day: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            next_day_return: day1,
            three_day_return: three_day,
            stock_up_next_day: day1 > 0.0,
            club_home: won,
            club_away: !won,
            club_won: won,
            match_outcome: if won { 1 } else { -1 },
            club_win_prob: surprise.map(|s| 1.0 - s),
            opponent_prob: Some(0.3),
            draw_prob: Some(0.25),
            bookmaker_margin: Some(0.06),
            surprise_factor: surprise,
            total_goals: 2,
            goal_difference: 1,
            is_domestic_league: true,
            is_champions_league: false,
            is_europa_league: false,
            is_domestic_cup: false,
            is_friendly: false,
        }
    }

    fn synthetic_rows(n: usize) -> Vec<FeatureRow> {
        (0..n)
            .map(|i| {
                let won = i % 2 == 0;
                let day1 = if won { 0.02 } else { -0.02 } + 0.001 * (i % 5) as f64;
                // partial reversal of the day-1 move
                let three_day = day1 * 0.4;
                row(i as i64, Some(0.75 + 0.01 * (i % 10) as f64), day1, three_day, won)
            })
            .collect()
    }

    #[test]
    fn dataset_keeps_only_high_surprise_rows() {
        let mut rows = synthetic_rows(10);
        rows.push(row(100, Some(0.2), 0.01, 0.02, true));
        rows.push(row(101, None, 0.01, 0.02, true));

        let data = build_dataset(&rows, 0.7).unwrap();
        assert_eq!(data.n_samples(), 10);
        assert_eq!(data.n_features(), CORRECTION_FEATURES.len());
        // targets satisfy the correction identity
        for (features, target) in data.features.iter().zip(&data.targets) {
            let day1 = features[1];
            assert!(target.is_finite());
            assert!(day1.abs() < 0.1);
        }
    }

    #[test]
    fn pipeline_reports_finite_metrics_and_full_importances() {
        let rows = synthetic_rows(40);
        let config = CorrectionModelConfig {
            gbm: GbmParams {
                n_trees: 30,
                learning_rate: 0.1,
                ..Default::default()
            },
            ..Default::default()
        };

        let report = train_correction_model(&rows, &config).unwrap();
        assert_eq!(report.n_high_surprise, 40);
        assert_eq!(report.n_train + report.n_test, 40);
        assert!(report.metrics.rmse.is_finite());
        assert!(report.metrics.r2.is_finite());
        assert_eq!(report.importances.len(), CORRECTION_FEATURES.len());
        // sorted descending
        for pair in report.importances.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn too_small_sample_is_a_hard_error() {
        let rows = synthetic_rows(4);
        let err = train_correction_model(&rows, &CorrectionModelConfig::default());
        assert!(matches!(err, Err(ModelError::InvalidData(_))));
    }
}

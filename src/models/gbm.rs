//! Gradient boosting regressor over CART trees
//!
//! A mean base prediction plus a sequence of shrunken residual trees.
//! Defaults mirror the correction-return trainer: 500 trees of depth 4
//! at learning rate 0.03.

use super::dataset::Dataset;
use super::tree::{RegressionTree, TreeParams};
use super::ModelError;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Boosting hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GbmParams {
    /// Number of boosting iterations (trees)
    pub n_trees: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Minimum samples required to split a node
    pub min_samples_split: usize,
    /// Minimum samples allowed in a leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
    /// Seed for the feature-subsampling RNG
    pub seed: u64,
}

impl Default for GbmParams {
    fn default() -> Self {
        Self {
            n_trees: 500,
            max_depth: 4,
            learning_rate: 0.03,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            seed: 42,
        }
    }
}

/// Hold-out evaluation metrics for a regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub rmse: f64,
    pub mae: f64,
    pub r2: f64,
    /// Share of predictions with the same sign as the target
    pub sign_agreement: f64,
}

impl ModelMetrics {
    /// Compute regression metrics from aligned truth/prediction slices
    pub fn regression(y_true: &[f64], y_pred: &[f64]) -> Result<Self, ModelError> {
        let n = y_true.len();
        if n == 0 || n != y_pred.len() {
            return Err(ModelError::InvalidData(format!(
                "metrics need aligned non-empty slices, got {} and {}",
                n,
                y_pred.len()
            )));
        }

        let mse: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .sum::<f64>()
            / n as f64;
        let mae: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).abs())
            .sum::<f64>()
            / n as f64;

        let mean_true = y_true.iter().sum::<f64>() / n as f64;
        let ss_tot: f64 = y_true.iter().map(|t| (t - mean_true).powi(2)).sum();
        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred)
            .map(|(t, p)| (t - p).powi(2))
            .sum();
        let r2 = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

        let agreeing = y_true
            .iter()
            .zip(y_pred)
            .filter(|(t, p)| t.signum() == p.signum())
            .count();

        Ok(Self {
            rmse: mse.sqrt(),
            mae,
            r2,
            sign_agreement: agreeing as f64 / n as f64,
        })
    }
}

/// Gradient boosting regression model
#[derive(Debug, Clone)]
pub struct GbmRegressor {
    params: GbmParams,
    base_prediction: Option<f64>,
    trees: Vec<RegressionTree>,
    feature_names: Vec<String>,
}

impl GbmRegressor {
    pub fn new(params: GbmParams) -> Self {
        Self {
            params,
            base_prediction: None,
            trees: Vec::new(),
            feature_names: Vec::new(),
        }
    }

    /// Fit the ensemble to a dataset
    pub fn fit(&mut self, data: &Dataset) -> Result<(), ModelError> {
        if data.n_samples() == 0 {
            return Err(ModelError::InvalidData("empty training set".to_string()));
        }

        self.feature_names = data.feature_names.clone();
        self.trees = Vec::with_capacity(self.params.n_trees);

        let base = data.targets.iter().sum::<f64>() / data.n_samples() as f64;
        self.base_prediction = Some(base);

        let mut predictions = vec![base; data.n_samples()];
        let mut rng = ChaCha8Rng::seed_from_u64(self.params.seed);

        let tree_params = TreeParams {
            max_depth: self.params.max_depth,
            min_samples_split: self.params.min_samples_split,
            min_samples_leaf: self.params.min_samples_leaf,
            max_features: self.params.max_features,
        };

        for round in 0..self.params.n_trees {
            let residuals: Vec<f64> = data
                .targets
                .iter()
                .zip(&predictions)
                .map(|(t, p)| t - p)
                .collect();

            let mut tree = RegressionTree::new(tree_params.clone());
            tree.fit(&data.features, &residuals, &mut rng);

            for (pred, row) in predictions.iter_mut().zip(&data.features) {
                *pred += self.params.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);

            if round % 100 == 0 {
                let train_mse = data
                    .targets
                    .iter()
                    .zip(&predictions)
                    .map(|(t, p)| (t - p).powi(2))
                    .sum::<f64>()
                    / data.n_samples() as f64;
                debug!(round, train_rmse = train_mse.sqrt(), "boosting progress");
            }
        }
        Ok(())
    }

    /// Predict one row
    pub fn predict_row(&self, row: &[f64]) -> Result<f64, ModelError> {
        let base = self.base_prediction.ok_or(ModelError::NotTrained)?;
        Ok(self
            .trees
            .iter()
            .fold(base, |acc, tree| {
                acc + self.params.learning_rate * tree.predict_row(row)
            }))
    }

    /// Predict a batch of rows
    pub fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        features.iter().map(|row| self.predict_row(row)).collect()
    }

    /// Normalized gain-weighted importances, aggregated over all trees
    pub fn feature_importances(&self) -> Vec<(String, f64)> {
        let n_features = self.feature_names.len();
        let mut totals = vec![0.0; n_features];
        for tree in &self.trees {
            for (total, imp) in totals.iter_mut().zip(tree.feature_importances()) {
                *total += imp;
            }
        }
        let sum: f64 = totals.iter().sum();
        if sum > 0.0 {
            for total in &mut totals {
                *total /= sum;
            }
        }
        self.feature_names
            .iter()
            .cloned()
            .zip(totals)
            .collect()
    }
}

//! CART regression tree with squared-error splits
//!
//! The base learner for gradient boosting. Splits minimize the weighted
//! child MSE over midpoint thresholds; stopping is controlled by depth,
//! split and leaf-size rules. Feature subsampling (for boosting variance
//! reduction) uses the caller's seeded RNG.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Stopping and subsampling rules for one tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth of the tree
    pub max_depth: usize,
    /// Minimum samples required to attempt a split
    pub min_samples_split: usize,
    /// Minimum samples allowed in a leaf
    pub min_samples_leaf: usize,
    /// Features considered per split (`None` = all)
    pub max_features: Option<usize>,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: 4,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

/// One node of the fitted tree
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TreeNode {
    feature_idx: Option<usize>,
    threshold: Option<f64>,
    /// Mean target of the node's samples
    value: f64,
    n_samples: usize,
    left: Option<Box<TreeNode>>,
    right: Option<Box<TreeNode>>,
}

impl TreeNode {
    fn leaf(value: f64, n_samples: usize) -> Self {
        Self {
            feature_idx: None,
            threshold: None,
            value,
            n_samples,
            left: None,
            right: None,
        }
    }
}

/// Regression tree model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegressionTree {
    params: TreeParams,
    root: Option<TreeNode>,
    /// Gain-weighted importance per feature, unnormalized
    feature_importances: Vec<f64>,
}

impl RegressionTree {
    pub fn new(params: TreeParams) -> Self {
        Self {
            params,
            root: None,
            feature_importances: Vec::new(),
        }
    }

    /// Fit the tree to row-major features and targets
    pub fn fit(&mut self, features: &[Vec<f64>], targets: &[f64], rng: &mut ChaCha8Rng) {
        let n_features = features.first().map(|row| row.len()).unwrap_or(0);
        self.feature_importances = vec![0.0; n_features];

        let indices: Vec<usize> = (0..features.len()).collect();
        self.root = Some(self.build_node(features, targets, &indices, 0, rng));
    }

    /// Predict a single row; 0 before fitting
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let Some(mut node) = self.root.as_ref() else {
            return 0.0;
        };
        while let (Some(feature_idx), Some(threshold)) = (node.feature_idx, node.threshold) {
            let child = if row.get(feature_idx).copied().unwrap_or(0.0) <= threshold {
                node.left.as_deref()
            } else {
                node.right.as_deref()
            };
            match child {
                Some(next) => node = next,
                None => break,
            }
        }
        node.value
    }

    /// Raw gain-weighted importances, one per feature
    pub fn feature_importances(&self) -> &[f64] {
        &self.feature_importances
    }

    fn build_node(
        &mut self,
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n = indices.len();
        let node_mean = mean_of(targets, indices);
        let impurity = mse_of(targets, indices, node_mean);

        if depth >= self.params.max_depth || n < self.params.min_samples_split || impurity < 1e-12
        {
            return TreeNode::leaf(node_mean, n);
        }

        let Some((feature_idx, threshold, left_idx, right_idx, gain)) =
            self.find_best_split(features, targets, indices, impurity, rng)
        else {
            return TreeNode::leaf(node_mean, n);
        };

        self.feature_importances[feature_idx] += gain * n as f64;

        let left = self.build_node(features, targets, &left_idx, depth + 1, rng);
        let right = self.build_node(features, targets, &right_idx, depth + 1, rng);

        TreeNode {
            feature_idx: Some(feature_idx),
            threshold: Some(threshold),
            value: node_mean,
            n_samples: n,
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    #[allow(clippy::type_complexity)]
    fn find_best_split(
        &self,
        features: &[Vec<f64>],
        targets: &[f64],
        indices: &[usize],
        parent_impurity: f64,
        rng: &mut ChaCha8Rng,
    ) -> Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> {
        let n_features = features.first()?.len();
        let max_features = self.params.max_features.unwrap_or(n_features).min(n_features);

        let mut feature_indices: Vec<usize> = (0..n_features).collect();
        if max_features < n_features {
            feature_indices.shuffle(rng);
            feature_indices.truncate(max_features);
        }

        let mut best_gain = 0.0;
        let mut best: Option<(usize, f64, Vec<usize>, Vec<usize>, f64)> = None;

        for &feature_idx in &feature_indices {
            let mut values: Vec<f64> = indices
                .iter()
                .map(|&i| features[i][feature_idx])
                .collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            values.dedup();

            for window in values.windows(2) {
                let threshold = (window[0] + window[1]) / 2.0;

                let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
                    .iter()
                    .partition(|&&i| features[i][feature_idx] <= threshold);

                if left_idx.len() < self.params.min_samples_leaf
                    || right_idx.len() < self.params.min_samples_leaf
                {
                    continue;
                }

                let left_mean = mean_of(targets, &left_idx);
                let right_mean = mean_of(targets, &right_idx);
                let left_impurity = mse_of(targets, &left_idx, left_mean);
                let right_impurity = mse_of(targets, &right_idx, right_mean);

                let n_left = left_idx.len() as f64;
                let n_right = right_idx.len() as f64;
                let weighted =
                    (n_left * left_impurity + n_right * right_impurity) / (n_left + n_right);
                let gain = parent_impurity - weighted;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature_idx, threshold, left_idx, right_idx, gain));
                }
            }
        }
        best
    }
}

fn mean_of(targets: &[f64], indices: &[usize]) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64
}

fn mse_of(targets: &[f64], indices: &[usize], mean: f64) -> f64 {
    if indices.is_empty() {
        return 0.0;
    }
    indices
        .iter()
        .map(|&i| (targets[i] - mean).powi(2))
        .sum::<f64>()
        / indices.len() as f64
}

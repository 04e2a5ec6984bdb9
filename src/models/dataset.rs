//! Named feature matrix with targets and a deterministic split

use super::ModelError;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Feature matrix (row-major) with targets and feature names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub features: Vec<Vec<f64>>,
    pub targets: Vec<f64>,
    pub feature_names: Vec<String>,
}

impl Dataset {
    /// Create a dataset; feature rows must match the target count and
    /// the feature-name count
    pub fn new(
        features: Vec<Vec<f64>>,
        targets: Vec<f64>,
        feature_names: Vec<String>,
    ) -> Result<Self, ModelError> {
        if features.len() != targets.len() {
            return Err(ModelError::InvalidData(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if let Some(bad) = features.iter().find(|row| row.len() != feature_names.len()) {
            return Err(ModelError::InvalidData(format!(
                "feature row has {} values, expected {}",
                bad.len(),
                feature_names.len()
            )));
        }
        Ok(Self {
            features,
            targets,
            feature_names,
        })
    }

    pub fn n_samples(&self) -> usize {
        self.features.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Seeded shuffle-then-split into train and test sets.
    ///
    /// Errors when either side of the split would be empty.
    pub fn train_test_split(
        &self,
        test_fraction: f64,
        seed: u64,
    ) -> Result<(Dataset, Dataset), ModelError> {
        let n = self.n_samples();
        let test_size = (n as f64 * test_fraction).round() as usize;
        if test_size == 0 || test_size >= n {
            return Err(ModelError::InvalidData(format!(
                "cannot split {} samples with test fraction {}",
                n, test_fraction
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let take = |idx: &[usize]| -> (Vec<Vec<f64>>, Vec<f64>) {
            (
                idx.iter().map(|&i| self.features[i].clone()).collect(),
                idx.iter().map(|&i| self.targets[i]).collect(),
            )
        };

        let (test_idx, train_idx) = indices.split_at(test_size);
        let (test_x, test_y) = take(test_idx);
        let (train_x, train_y) = take(train_idx);

        Ok((
            Dataset::new(train_x, train_y, self.feature_names.clone())?,
            Dataset::new(test_x, test_y, self.feature_names.clone())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        let features: Vec<Vec<f64>> = (0..n).map(|i| vec![i as f64, (2 * i) as f64]).collect();
        let targets: Vec<f64> = (0..n).map(|i| i as f64).collect();
        Dataset::new(features, targets, vec!["a".to_string(), "b".to_string()]).unwrap()
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        assert!(Dataset::new(vec![vec![1.0]], vec![], vec!["a".to_string()]).is_err());
        assert!(Dataset::new(vec![vec![1.0, 2.0]], vec![0.5], vec!["a".to_string()]).is_err());
    }

    #[test]
    fn split_proportions_and_determinism() {
        let data = dataset(20);
        let (train_a, test_a) = data.train_test_split(0.25, 42).unwrap();
        assert_eq!(train_a.n_samples(), 15);
        assert_eq!(test_a.n_samples(), 5);

        // same seed reproduces the split, different seed reshuffles
        let (train_b, test_b) = data.train_test_split(0.25, 42).unwrap();
        assert_eq!(train_a.targets, train_b.targets);
        assert_eq!(test_a.targets, test_b.targets);

        let (_, test_c) = data.train_test_split(0.25, 7).unwrap();
        assert_ne!(test_a.targets, test_c.targets);

        // split partitions the samples
        let mut all: Vec<f64> = train_a
            .targets
            .iter()
            .chain(test_a.targets.iter())
            .copied()
            .collect();
        all.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(all, data.targets);
    }

    #[test]
    fn degenerate_splits_are_errors() {
        let data = dataset(3);
        assert!(data.train_test_split(0.0, 42).is_err());
        assert!(data.train_test_split(1.0, 42).is_err());
    }
}

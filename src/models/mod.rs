//! Regression models for the post-surprise correction return

pub mod correction;
pub mod dataset;
pub mod gbm;
pub mod tree;

use thiserror::Error;

pub use correction::{train_correction_model, CorrectionModelConfig, CorrectionModelReport};
pub use dataset::Dataset;
pub use gbm::{GbmParams, GbmRegressor, ModelMetrics};
pub use tree::{RegressionTree, TreeParams};

/// Errors that can occur when building or applying a model
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("model not trained")]
    NotTrained,
}

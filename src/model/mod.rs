//! Minimal learning capabilities used by the imputers.
//!
//! The imputers only depend on the [`Regressor`] and [`Classifier`] traits, so
//! the concrete estimators here can be swapped without touching pipeline logic.

pub mod encoder;
pub mod forest;
pub mod linear;

pub use encoder::LabelEncoder;
pub use forest::{ForestParams, RandomForestClassifier};
pub use linear::LinearRegression;

use thiserror::Error;

/// Row-major feature matrix: one inner vector per sample
pub type Features = [Vec<f64>];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("cannot fit on an empty training set")]
    EmptyTrainingSet,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("normal equations are singular")]
    Singular,

    #[error("unknown label: {0}")]
    UnknownLabel(String),

    #[error("model has not been fitted")]
    NotFitted,
}

/// Continuous target estimator
pub trait Regressor {
    fn fit(&mut self, features: &Features, targets: &[f64]) -> Result<(), ModelError>;
    fn predict(&self, features: &Features) -> Result<Vec<f64>, ModelError>;
}

/// Class-code estimator. Labels are dense codes starting at zero.
pub trait Classifier {
    fn fit(&mut self, features: &Features, labels: &[usize]) -> Result<(), ModelError>;
    fn predict(&self, features: &Features) -> Result<Vec<usize>, ModelError>;
}

/// Check that every row has the same width and return it
pub(crate) fn feature_width(features: &Features) -> Result<usize, ModelError> {
    let width = features.first().map(Vec::len).ok_or(ModelError::EmptyTrainingSet)?;
    for row in features {
        if row.len() != width {
            return Err(ModelError::DimensionMismatch {
                expected: width,
                actual: row.len(),
            });
        }
    }
    Ok(width)
}

pub(crate) fn check_lengths(rows: usize, targets: usize) -> Result<(), ModelError> {
    if rows != targets {
        return Err(ModelError::DimensionMismatch {
            expected: rows,
            actual: targets,
        });
    }
    Ok(())
}

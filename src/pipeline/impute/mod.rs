//! Model-based imputation of missing tenure and performance category.
//!
//! Both imputers are best effort: when the training data cannot support a
//! model, or fitting fails, they fall back to a fixed default and report why.

pub mod experience;
pub mod rating;

pub use experience::ExperienceImputer;
pub use rating::RatingImputer;

use serde::Serialize;
use std::fmt;

/// Why an imputer did not use its model
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTrainingRows,
    ConstantTarget,
    TooFewClasses,
    ModelFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTrainingRows => write!(f, "no training rows"),
            SkipReason::ConstantTarget => write!(f, "training target has no variance"),
            SkipReason::TooFewClasses => write!(f, "fewer than two distinct classes"),
            SkipReason::ModelFailed(e) => write!(f, "model failed: {}", e),
        }
    }
}

/// Summary of one imputation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImputationOutcome {
    /// Rows whose target value was already known
    pub training_rows: usize,
    /// Missing values filled by the model
    pub predicted: usize,
    /// Missing values filled by the fallback default
    pub defaulted: usize,
    pub skipped: Option<SkipReason>,
}

impl ImputationOutcome {
    pub fn filled(&self) -> usize {
        self.predicted + self.defaulted
    }
}

use tracing::{debug, info, warn};

use super::{ImputationOutcome, SkipReason};
use crate::model::{LinearRegression, Regressor};
use crate::observability::metrics;
use crate::types::EmployeeRecord;

/// Tenure assigned when no prediction is possible
pub const DEFAULT_EXPERIENCE_YEARS: f64 = 0.0;

/// Fills missing `experience_years` from the join date.
///
/// A regression is fitted on rows that have both a join date and a known
/// tenure. Rows without a usable join date, or every missing row when the fit
/// is skipped, receive [`DEFAULT_EXPERIENCE_YEARS`].
pub struct ExperienceImputer<R: Regressor = LinearRegression> {
    regressor: R,
}

impl ExperienceImputer<LinearRegression> {
    pub fn new() -> Self {
        Self::with_regressor(LinearRegression::new())
    }
}

impl Default for ExperienceImputer<LinearRegression> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Regressor> ExperienceImputer<R> {
    pub fn with_regressor(regressor: R) -> Self {
        Self { regressor }
    }

    /// Consumes the imputer so no fitted model outlives the run
    pub fn impute(mut self, records: &mut [EmployeeRecord]) -> ImputationOutcome {
        let (features, targets): (Vec<Vec<f64>>, Vec<f64>) = records
            .iter()
            .filter_map(|r| Some((vec![r.join_date_secs()?], r.experience_years?)))
            .unzip();

        let mut outcome = ImputationOutcome {
            training_rows: targets.len(),
            ..Default::default()
        };

        outcome.skipped = if targets.is_empty() {
            Some(SkipReason::NoTrainingRows)
        } else if targets.iter().all(|t| *t == targets[0]) {
            Some(SkipReason::ConstantTarget)
        } else {
            self.regressor
                .fit(&features, &targets)
                .err()
                .map(|e| SkipReason::ModelFailed(e.to_string()))
        };

        if outcome.skipped.is_none() {
            match self.predict_missing(records) {
                Ok(predicted) => outcome.predicted = predicted,
                Err(reason) => outcome.skipped = Some(reason),
            }
        }

        match &outcome.skipped {
            Some(reason) => info!(%reason, "Experience regression skipped"),
            None => debug!(predicted = outcome.predicted, "Experience regression applied"),
        }

        for record in records.iter_mut().filter(|r| r.experience_years.is_none()) {
            record.experience_years = Some(DEFAULT_EXPERIENCE_YEARS);
            outcome.defaulted += 1;
        }

        metrics::imputation::recorded("experience", &outcome);
        outcome
    }

    fn predict_missing(&self, records: &mut [EmployeeRecord]) -> Result<usize, SkipReason> {
        let pending: Vec<(usize, f64)> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.experience_years.is_none())
            .filter_map(|(idx, r)| Some((idx, r.join_date_secs()?)))
            .collect();
        if pending.is_empty() {
            return Ok(0);
        }

        let rows: Vec<Vec<f64>> = pending.iter().map(|(_, secs)| vec![*secs]).collect();
        let predictions = self
            .regressor
            .predict(&rows)
            .map_err(|e| SkipReason::ModelFailed(e.to_string()))?;

        let mut filled = 0;
        for ((idx, _), prediction) in pending.into_iter().zip(predictions) {
            if !prediction.is_finite() {
                warn!(row = idx, "Non-finite tenure prediction, leaving for default");
                continue;
            }
            records[idx].experience_years = Some(round_years(prediction));
            filled += 1;
        }
        Ok(filled)
    }
}

/// Round to whole years, half away from zero, and clamp at zero
fn round_years(prediction: f64) -> f64 {
    let years = prediction.round();
    if years > 0.0 {
        years
    } else {
        0.0
    }
}

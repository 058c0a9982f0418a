use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::{ImputationOutcome, SkipReason};
use crate::model::{Classifier, ForestParams, LabelEncoder, ModelError, RandomForestClassifier};
use crate::observability::metrics;
use crate::types::{EmployeeRecord, PerformanceCategory};

/// Fills missing `performance_category` with a classifier over
/// [experience, salary, join date, department, country].
///
/// Department and country encoders are fitted over every record in the set,
/// not only the training rows, so a label that appears only on a row needing
/// prediction still has a code.
pub struct RatingImputer<C: Classifier = RandomForestClassifier> {
    classifier: C,
}

impl RatingImputer<RandomForestClassifier> {
    pub fn new(params: ForestParams) -> Self {
        Self::with_classifier(RandomForestClassifier::new(params))
    }
}

impl<C: Classifier> RatingImputer<C> {
    pub fn with_classifier(classifier: C) -> Self {
        Self { classifier }
    }

    pub fn impute(mut self, records: &mut [EmployeeRecord]) -> ImputationOutcome {
        let (training, missing): (Vec<usize>, Vec<usize>) =
            (0..records.len()).partition(|&i| records[i].performance_category.is_some());

        let mut outcome = ImputationOutcome {
            training_rows: training.len(),
            ..Default::default()
        };
        if missing.is_empty() {
            metrics::imputation::recorded("rating", &outcome);
            return outcome;
        }

        let distinct: BTreeSet<PerformanceCategory> = training
            .iter()
            .filter_map(|&i| records[i].performance_category)
            .collect();

        if training.is_empty() {
            outcome.skipped = Some(SkipReason::NoTrainingRows);
        } else if distinct.len() < 2 {
            outcome.skipped = Some(SkipReason::TooFewClasses);
        } else {
            match self.predict(records, &training, &missing) {
                Ok(predictions) => {
                    for (&idx, category) in missing.iter().zip(predictions) {
                        records[idx].performance_category = Some(category);
                        outcome.predicted += 1;
                    }
                    debug!(predicted = outcome.predicted, "Rating classifier applied");
                }
                Err(e) => {
                    warn!(error = %e, "Rating classifier failed, using default category");
                    outcome.skipped = Some(SkipReason::ModelFailed(e.to_string()));
                }
            }
        }

        if let Some(reason) = &outcome.skipped {
            info!(%reason, default = %PerformanceCategory::DEFAULT, "Rating classifier skipped");
        }
        for record in records.iter_mut().filter(|r| r.performance_category.is_none()) {
            record.performance_category = Some(PerformanceCategory::DEFAULT);
            outcome.defaulted += 1;
        }

        metrics::imputation::recorded("rating", &outcome);
        outcome
    }

    fn predict(
        &mut self,
        records: &[EmployeeRecord],
        training: &[usize],
        missing: &[usize],
    ) -> Result<Vec<PerformanceCategory>, ModelError> {
        let encoder = FeatureEncoder::fit(records);

        let train_x = training
            .iter()
            .map(|&i| encoder.encode(&records[i]))
            .collect::<Result<Vec<_>, _>>()?;
        let train_y: Vec<usize> = training
            .iter()
            .filter_map(|&i| records[i].performance_category.map(PerformanceCategory::code))
            .collect();
        self.classifier.fit(&train_x, &train_y)?;

        let predict_x = missing
            .iter()
            .map(|&i| encoder.encode(&records[i]))
            .collect::<Result<Vec<_>, _>>()?;

        self.classifier
            .predict(&predict_x)?
            .into_iter()
            .map(|code| {
                PerformanceCategory::from_code(code)
                    .ok_or_else(|| ModelError::UnknownLabel(code.to_string()))
            })
            .collect()
    }
}

/// Turns a record into its numeric feature vector.
/// Missing numeric values become NaN.
struct FeatureEncoder {
    departments: LabelEncoder,
    countries: LabelEncoder,
}

impl FeatureEncoder {
    fn fit(records: &[EmployeeRecord]) -> Self {
        Self {
            departments: LabelEncoder::fit(records.iter().map(|r| r.department.as_str())),
            countries: LabelEncoder::fit(records.iter().map(|r| r.country.as_str())),
        }
    }

    fn encode(&self, record: &EmployeeRecord) -> Result<Vec<f64>, ModelError> {
        Ok(vec![
            record.experience_years.unwrap_or(f64::NAN),
            record.salary.unwrap_or(f64::NAN),
            record.join_date_secs().unwrap_or(f64::NAN),
            self.departments.transform(&record.department)? as f64,
            self.countries.transform(&record.country)? as f64,
        ])
    }
}

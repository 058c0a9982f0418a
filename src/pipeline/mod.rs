// Cleaning pipeline: dedup, normalization, and imputation over one record set

pub mod impute;
pub mod normalize;

use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, instrument};

use crate::idempotency::compute_output_digest;
use crate::model::ForestParams;
use crate::observability::metrics;
use crate::types::{CleanRecord, RawRecord};
use impute::{ExperienceImputer, ImputationOutcome, RatingImputer};

/// What happened during one cleaning run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleaningReport {
    pub input_rows: usize,
    pub duplicates_dropped: usize,
    pub output_rows: usize,
    /// Rows with a join date that could not be parsed
    pub unparseable_dates: usize,
    pub experience: ImputationOutcome,
    pub rating: ImputationOutcome,
    /// SHA-256 over the clean rows; equal digests mean identical output
    pub output_digest: String,
}

/// Orchestrates normalization and the two imputers in strict order.
/// Holds configuration only; every model is built and dropped inside `run`.
#[derive(Debug, Clone, Default)]
pub struct CleaningPipeline {
    forest: ForestParams,
}

impl CleaningPipeline {
    pub fn new(forest: ForestParams) -> Self {
        Self { forest }
    }

    #[instrument(skip_all, fields(rows = raw.len()))]
    pub fn run(&self, raw: Vec<RawRecord>) -> (Vec<CleanRecord>, CleaningReport) {
        let started = Instant::now();
        let input_rows = raw.len();
        let (raw, duplicates_dropped) = drop_duplicates(raw);
        if duplicates_dropped > 0 {
            info!(duplicates_dropped, "Dropped duplicate rows");
        }

        let mut records: Vec<_> = raw.iter().map(normalize::normalize_record).collect();
        let unparseable_dates = raw
            .iter()
            .zip(&records)
            .filter(|(r, n)| {
                r.date_of_joining.as_deref().is_some_and(|d| !d.trim().is_empty()) && n.join_date.is_none()
            })
            .count();
        debug!(unparseable_dates, "Normalized records");

        // Rating features consume experience, so experience must be filled first
        let experience = ExperienceImputer::new().impute(&mut records);
        let rating = RatingImputer::new(self.forest.clone()).impute(&mut records);

        let clean: Vec<CleanRecord> = records.into_iter().map(|r| r.into_clean()).collect();
        let report = CleaningReport {
            input_rows,
            duplicates_dropped,
            output_rows: clean.len(),
            unparseable_dates,
            experience,
            rating,
            output_digest: compute_output_digest(&clean),
        };

        metrics::pipeline::run_completed(&report, started.elapsed().as_secs_f64());
        info!(
            output_rows = report.output_rows,
            experience_filled = report.experience.filled(),
            rating_filled = report.rating.filled(),
            "Cleaning finished"
        );
        (clean, report)
    }
}

/// Remove exact duplicate rows, keeping the first occurrence in order
fn drop_duplicates(raw: Vec<RawRecord>) -> (Vec<RawRecord>, usize) {
    let before = raw.len();
    let mut seen = HashSet::with_capacity(before);
    let unique: Vec<RawRecord> = raw.into_iter().filter(|r| seen.insert(r.dedup_key())).collect();
    let dropped = before - unique.len();
    (unique, dropped)
}

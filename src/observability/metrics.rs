//! Metrics for the employee ETL.
//!
//! Recording goes through the `metrics` facade and is a no-op until a recorder
//! is installed. The CLI installs the Prometheus recorder when a textfile path
//! is configured and writes the rendered exposition after each run.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{EtlError, Result};

/// All metric names used by the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Source
    SourceRecordsRead,

    // Storage
    StorageRowsWritten,
    StorageTablesReplaced,

    // Pipeline
    PipelineRuns,
    PipelineDuration,
    PipelineBatchSize,
    PipelineDuplicatesDropped,
    PipelineUnparseableDates,

    // Imputation
    ImputationTrainingRows,
    ImputationPredicted,
    ImputationDefaulted,
    ImputationSkipped,
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::SourceRecordsRead => "employee_etl_source_records_read_total",

            MetricName::StorageRowsWritten => "employee_etl_storage_rows_written_total",
            MetricName::StorageTablesReplaced => "employee_etl_storage_tables_replaced_total",

            MetricName::PipelineRuns => "employee_etl_pipeline_runs_total",
            MetricName::PipelineDuration => "employee_etl_pipeline_duration_seconds",
            MetricName::PipelineBatchSize => "employee_etl_pipeline_batch_size",
            MetricName::PipelineDuplicatesDropped => "employee_etl_pipeline_duplicates_dropped_total",
            MetricName::PipelineUnparseableDates => "employee_etl_pipeline_unparseable_dates_total",

            MetricName::ImputationTrainingRows => "employee_etl_imputation_training_rows",
            MetricName::ImputationPredicted => "employee_etl_imputation_predicted_total",
            MetricName::ImputationDefaulted => "employee_etl_imputation_defaulted_total",
            MetricName::ImputationSkipped => "employee_etl_imputation_skipped_total",
        }
    }
}

/// Install the Prometheus recorder as the global metrics recorder
pub fn install_recorder() -> Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| EtlError::Metrics(e.to_string()))
}

/// Write the current exposition text, creating parent directories as needed
pub fn write_textfile(handle: &PrometheusHandle, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, handle.render())?;
    Ok(())
}

pub mod source {
    use super::MetricName;

    pub fn records_read(count: usize) {
        ::metrics::counter!(MetricName::SourceRecordsRead.as_str()).increment(count as u64);
    }
}

pub mod storage {
    use super::MetricName;

    /// Record a wholesale table replacement
    pub fn table_replaced(table: &str, rows: usize) {
        ::metrics::counter!(MetricName::StorageTablesReplaced.as_str(), "table" => table.to_string())
            .increment(1);
        ::metrics::counter!(MetricName::StorageRowsWritten.as_str(), "table" => table.to_string())
            .increment(rows as u64);
    }
}

pub mod imputation {
    use super::MetricName;
    use crate::pipeline::impute::ImputationOutcome;

    pub fn recorded(field: &'static str, outcome: &ImputationOutcome) {
        ::metrics::gauge!(MetricName::ImputationTrainingRows.as_str(), "field" => field)
            .set(outcome.training_rows as f64);
        ::metrics::counter!(MetricName::ImputationPredicted.as_str(), "field" => field)
            .increment(outcome.predicted as u64);
        ::metrics::counter!(MetricName::ImputationDefaulted.as_str(), "field" => field)
            .increment(outcome.defaulted as u64);
        if outcome.skipped.is_some() {
            ::metrics::counter!(MetricName::ImputationSkipped.as_str(), "field" => field).increment(1);
        }
    }
}

pub mod pipeline {
    use super::MetricName;
    use crate::pipeline::CleaningReport;

    pub fn run_completed(report: &CleaningReport, duration_secs: f64) {
        ::metrics::counter!(MetricName::PipelineRuns.as_str()).increment(1);
        ::metrics::histogram!(MetricName::PipelineDuration.as_str()).record(duration_secs);
        ::metrics::histogram!(MetricName::PipelineBatchSize.as_str()).record(report.input_rows as f64);
        ::metrics::counter!(MetricName::PipelineDuplicatesDropped.as_str())
            .increment(report.duplicates_dropped as u64);
        ::metrics::counter!(MetricName::PipelineUnparseableDates.as_str())
            .increment(report.unparseable_dates as u64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_prefixed() {
        let names = [
            MetricName::SourceRecordsRead,
            MetricName::StorageRowsWritten,
            MetricName::PipelineRuns,
            MetricName::ImputationSkipped,
        ];
        for name in names {
            assert!(name.to_string().starts_with("employee_etl_"));
        }
    }
}

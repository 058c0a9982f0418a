use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::error::Result;
use crate::pipeline::{CleaningPipeline, CleaningReport};
use crate::storage::{EmployeeStore, RecordSource};

/// Summary of a job invocation. Steps that did not run are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub staged_rows: Option<usize>,
    pub cleaning: Option<CleaningReport>,
}

/// Drives source -> staging -> pipeline -> clean table.
/// One job is one run id; each step logs under a span carrying it.
pub struct EtlJob {
    run_id: Uuid,
    pipeline: CleaningPipeline,
}

impl EtlJob {
    pub fn new(pipeline: CleaningPipeline) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            pipeline,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Read every raw row from `source` and replace the staging table with them
    pub fn load_staging(&self, source: &dyn RecordSource, store: &mut dyn EmployeeStore) -> Result<usize> {
        let span = info_span!("load_staging", run_id = %self.run_id);
        let _enter = span.enter();

        let records = source.read_records()?;
        store.replace_staging(&records)?;
        info!("Staged {} rows", records.len());
        Ok(records.len())
    }

    /// Clean the staging table and replace the clean table with the result
    pub fn clean(&self, store: &mut dyn EmployeeStore) -> Result<CleaningReport> {
        let span = info_span!("clean", run_id = %self.run_id);
        let _enter = span.enter();

        let raw = store.load_staging()?;
        let (clean, report) = self.pipeline.run(raw);
        store.replace_clean(&clean)?;
        info!(digest = %report.output_digest, "Wrote {} clean rows", clean.len());
        Ok(report)
    }

    pub fn run(&self, source: &dyn RecordSource, store: &mut dyn EmployeeStore) -> Result<JobReport> {
        let staged_rows = self.load_staging(source, store)?;
        let cleaning = self.clean(store)?;
        Ok(JobReport {
            run_id: self.run_id,
            staged_rows: Some(staged_rows),
            cleaning: Some(cleaning),
        })
    }
}

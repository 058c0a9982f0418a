use csv::{ReaderBuilder, Trim};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{EtlError, Result};
use crate::observability::metrics;
use crate::storage::RecordSource;
use crate::types::RawRecord;

/// Reads raw employee rows from a CSV file with a header line.
/// Headers and cells are trimmed. Blank cells become `None`; numeric columns
/// that do not parse become `None`.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
}

impl CsvSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordSource for CsvSource {
    fn read_records(&self) -> Result<Vec<RawRecord>> {
        if !self.path.is_file() {
            return Err(EtlError::SourceMissing(self.path.clone()));
        }

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        for column in crate::constants::COLUMNS {
            if !headers.iter().any(|h| h == column) {
                warn!(column, "Source is missing a column, treating it as blank");
            }
        }

        let mut records = Vec::new();
        for row in reader.deserialize::<RawRecord>() {
            records.push(row?);
        }

        info!("Read {} rows from {}", records.len(), self.path.display());
        metrics::source::records_read(records.len());
        Ok(records)
    }
}

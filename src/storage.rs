use crate::error::Result;
use crate::types::{CleanRecord, RawRecord};
use tracing::debug;

/// Supplies the raw employee rows for a run
pub trait RecordSource {
    fn read_records(&self) -> Result<Vec<RawRecord>>;
}

/// Persistent home of the staging and clean tables.
///
/// Every `replace_*` call swaps out the whole table: after it returns the
/// table holds exactly the given rows. There is no merge or append.
pub trait EmployeeStore {
    fn replace_staging(&mut self, records: &[RawRecord]) -> Result<()>;
    fn load_staging(&self) -> Result<Vec<RawRecord>>;

    fn replace_clean(&mut self, records: &[CleanRecord]) -> Result<()>;
    fn load_clean(&self) -> Result<Vec<CleanRecord>>;
}

/// In-memory storage implementation for development/testing
#[derive(Debug, Default)]
pub struct InMemoryStore {
    staging: Vec<RawRecord>,
    clean: Vec<CleanRecord>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EmployeeStore for InMemoryStore {
    fn replace_staging(&mut self, records: &[RawRecord]) -> Result<()> {
        self.staging = records.to_vec();
        debug!("Replaced in-memory staging with {} rows", records.len());
        Ok(())
    }

    fn load_staging(&self) -> Result<Vec<RawRecord>> {
        Ok(self.staging.clone())
    }

    fn replace_clean(&mut self, records: &[CleanRecord]) -> Result<()> {
        self.clean = records.to_vec();
        debug!("Replaced in-memory clean table with {} rows", records.len());
        Ok(())
    }

    fn load_clean(&self) -> Result<Vec<CleanRecord>> {
        Ok(self.clean.clone())
    }
}

/// Fixed record set, used when rows come from somewhere other than a file
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    records: Vec<RawRecord>,
}

impl StaticSource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for StaticSource {
    fn read_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_replace_is_wholesale() {
        let mut store = InMemoryStore::new();
        let row = RawRecord {
            name: Some("a".into()),
            ..Default::default()
        };
        store.replace_staging(&[row.clone(), row.clone(), row.clone()]).unwrap();
        assert_eq!(store.load_staging().unwrap().len(), 3);

        store.replace_staging(&[row]).unwrap();
        assert_eq!(store.load_staging().unwrap().len(), 1);
    }
}

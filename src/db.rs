use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::{params, Connection, Row};
use std::path::Path;
use tracing::info;

use crate::constants::COLUMNS;
use crate::error::{EtlError, Result};
use crate::observability::metrics;
use crate::storage::EmployeeStore;
use crate::types::{CleanRecord, PerformanceCategory, RawRecord};

static TABLE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("table name pattern is valid")
});

pub fn validate_table_name(name: &str) -> Result<()> {
    if TABLE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(EtlError::Config(format!("Invalid table name '{}'", name)))
    }
}

/// SQLite-backed staging and clean tables
pub struct SqliteStore {
    conn: Connection,
    staging_table: String,
    clean_table: String,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P, staging_table: &str, clean_table: &str) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;
        info!("Opened SQLite database: {}", path.as_ref().display());
        Self::with_connection(conn, staging_table, clean_table)
    }

    pub fn open_in_memory(staging_table: &str, clean_table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, staging_table, clean_table)
    }

    fn with_connection(conn: Connection, staging_table: &str, clean_table: &str) -> Result<Self> {
        validate_table_name(staging_table)?;
        validate_table_name(clean_table)?;
        Ok(Self {
            conn,
            staging_table: staging_table.to_string(),
            clean_table: clean_table.to_string(),
        })
    }

    /// Drop and recreate `table`, then insert every row, in one transaction
    fn replace_table<T>(
        &mut self,
        table: &str,
        column_types: [&str; 7],
        rows: &[T],
        bind: impl Fn(&T) -> [rusqlite::types::Value; 7],
    ) -> Result<()> {
        let columns: Vec<String> = COLUMNS
            .iter()
            .zip(column_types)
            .map(|(name, ty)| format!("\"{}\" {}", name, ty))
            .collect();
        let quoted: Vec<String> = COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        let placeholders: Vec<String> = (1..=COLUMNS.len()).map(|i| format!("?{}", i)).collect();

        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS \"{table}\";\nCREATE TABLE \"{table}\" ({});",
            columns.join(", ")
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO \"{}\" ({}) VALUES ({})",
                table,
                quoted.join(", "),
                placeholders.join(", ")
            ))?;
            for row in rows {
                stmt.execute(rusqlite::params_from_iter(bind(row)))?;
            }
        }
        tx.commit()?;

        info!("Replaced table '{}' with {} rows", table, rows.len());
        metrics::storage::table_replaced(table, rows.len());
        Ok(())
    }

    fn select_all<T>(&self, table: &str, map: impl Fn(&Row<'_>) -> rusqlite::Result<T>) -> Result<Vec<T>> {
        let quoted: Vec<String> = COLUMNS.iter().map(|c| format!("\"{}\"", c)).collect();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM \"{}\" ORDER BY rowid", quoted.join(", "), table))?;
        let rows = stmt.query_map(params![], |row| map(row))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        validate_table_name(table)?;
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{}\"", table), params![], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn staging_table(&self) -> &str {
        &self.staging_table
    }

    pub fn clean_table(&self) -> &str {
        &self.clean_table
    }
}

fn text(value: &Option<String>) -> rusqlite::types::Value {
    value.clone().map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Text)
}

fn real(value: Option<f64>) -> rusqlite::types::Value {
    value.map_or(rusqlite::types::Value::Null, rusqlite::types::Value::Real)
}

impl EmployeeStore for SqliteStore {
    fn replace_staging(&mut self, records: &[RawRecord]) -> Result<()> {
        let table = self.staging_table.clone();
        self.replace_table(
            &table,
            ["TEXT", "TEXT", "TEXT", "TEXT", "REAL", "REAL", "TEXT"],
            records,
            |r| {
                [
                    text(&r.name),
                    text(&r.department),
                    text(&r.date_of_joining),
                    text(&r.country),
                    real(r.experience_years),
                    real(r.salary),
                    text(&r.performance_rating),
                ]
            },
        )
    }

    fn load_staging(&self) -> Result<Vec<RawRecord>> {
        self.select_all(&self.staging_table, |row| {
            Ok(RawRecord {
                name: row.get(0)?,
                department: row.get(1)?,
                date_of_joining: row.get(2)?,
                country: row.get(3)?,
                experience_years: row.get(4)?,
                salary: row.get(5)?,
                performance_rating: row.get(6)?,
            })
        })
    }

    fn replace_clean(&mut self, records: &[CleanRecord]) -> Result<()> {
        let table = self.clean_table.clone();
        self.replace_table(
            &table,
            ["TEXT NOT NULL", "TEXT NOT NULL", "TEXT", "TEXT NOT NULL", "REAL NOT NULL", "REAL", "TEXT NOT NULL"],
            records,
            |r| {
                [
                    rusqlite::types::Value::Text(r.name.clone()),
                    rusqlite::types::Value::Text(r.department.clone()),
                    text(&r.date_of_joining),
                    rusqlite::types::Value::Text(r.country.clone()),
                    rusqlite::types::Value::Real(r.experience_years),
                    real(r.salary),
                    rusqlite::types::Value::Text(r.performance_rating.label().to_string()),
                ]
            },
        )
    }

    fn load_clean(&self) -> Result<Vec<CleanRecord>> {
        self.select_all(&self.clean_table, |row| {
            let label: String = row.get(6)?;
            let performance_rating = PerformanceCategory::parse(&label).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    6,
                    rusqlite::types::Type::Text,
                    format!("unknown performance rating '{}'", label).into(),
                )
            })?;
            Ok(CleanRecord {
                name: row.get(0)?,
                department: row.get(1)?,
                date_of_joining: row.get(2)?,
                country: row.get(3)?,
                experience_years: row.get(4)?,
                salary: row.get(5)?,
                performance_rating,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_validation() {
        assert!(validate_table_name("employee_data").is_ok());
        assert!(validate_table_name("_staging2").is_ok());
        assert!(validate_table_name("2fast").is_err());
        assert!(validate_table_name("drop table; --").is_err());
        assert!(validate_table_name("").is_err());
    }

    #[test]
    fn test_open_rejects_bad_table_names() {
        assert!(matches!(
            SqliteStore::open_in_memory("ok", "bad name"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn test_configured_table_names_are_kept() {
        let store = SqliteStore::open_in_memory("raw_rows", "clean_rows").unwrap();
        assert_eq!(store.staging_table(), "raw_rows");
        assert_eq!(store.clean_table(), "clean_rows");
    }

    #[test]
    fn test_staging_round_trip_preserves_nulls() {
        let mut store = SqliteStore::open_in_memory("staging", "clean").unwrap();
        let rows = vec![
            RawRecord {
                name: Some("Ann".into()),
                department: None,
                date_of_joining: Some("03/05/2020".into()),
                country: None,
                experience_years: Some(2.5),
                salary: None,
                performance_rating: Some("Top Performers".into()),
            },
            RawRecord::default(),
        ];
        store.replace_staging(&rows).unwrap();
        assert_eq!(store.load_staging().unwrap(), rows);
    }

    #[test]
    fn test_replace_overwrites_previous_rows() {
        let mut store = SqliteStore::open_in_memory("staging", "clean").unwrap();
        let row = CleanRecord {
            name: "Ann".into(),
            department: "HR".into(),
            date_of_joining: None,
            country: "Unknown".into(),
            experience_years: 0.0,
            salary: Some(1.0),
            performance_rating: PerformanceCategory::Average,
        };
        store.replace_clean(&[row.clone(), row.clone(), row.clone()]).unwrap();
        store.replace_clean(&[row.clone()]).unwrap();

        assert_eq!(store.row_count("clean").unwrap(), 1);
        assert_eq!(store.load_clean().unwrap(), vec![row]);
    }
}

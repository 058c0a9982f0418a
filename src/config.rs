use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::constants::*;
use crate::db::validate_table_name;
use crate::error::{EtlError, Result};
use crate::model::ForestParams;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub storage: StorageConfig,
    pub imputation: ImputationConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub staging_table: String,
    pub clean_table: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImputationConfig {
    pub forest_trees: usize,
    pub random_seed: u64,
    /// 0 means unlimited
    pub max_depth: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Prometheus textfile written after each run
    pub textfile: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            staging_table: DEFAULT_STAGING_TABLE.to_string(),
            clean_table: DEFAULT_CLEAN_TABLE.to_string(),
        }
    }
}

impl Default for ImputationConfig {
    fn default() -> Self {
        Self {
            forest_trees: DEFAULT_FOREST_TREES,
            random_seed: DEFAULT_RANDOM_SEED,
            max_depth: 0,
        }
    }
}

impl ImputationConfig {
    pub fn forest_params(&self) -> ForestParams {
        ForestParams {
            n_trees: self.forest_trees,
            max_depth: (self.max_depth > 0).then_some(self.max_depth),
            seed: self.random_seed,
            ..ForestParams::default()
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file does not
    /// exist, then apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let config_content = fs::read_to_string(path).map_err(|e| {
                EtlError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
            })?;
            Self::from_toml(&config_content)?
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = env::var(ENV_SOURCE_PATH) {
            if !path.trim().is_empty() {
                self.source.csv_path = PathBuf::from(path);
            }
        }
        if let Ok(path) = env::var(ENV_DATABASE_PATH) {
            if !path.trim().is_empty() {
                self.storage.database_path = PathBuf::from(path);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.imputation.forest_trees == 0 {
            return Err(EtlError::Config("imputation.forest_trees must be at least 1".to_string()));
        }
        validate_table_name(&self.storage.staging_table)?;
        validate_table_name(&self.storage.clean_table)?;
        if self.storage.staging_table == self.storage.clean_table {
            return Err(EtlError::Config(
                "storage.staging_table and storage.clean_table must differ".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.source.csv_path, PathBuf::from("data/employee_data_source.csv"));
        assert_eq!(config.storage.staging_table, "employee_data_source");
        assert_eq!(config.storage.clean_table, "employee_data");
        assert_eq!(config.imputation.forest_params(), ForestParams::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        let config = Config::from_toml(
            r#"
            [imputation]
            forest_trees = 10
            max_depth = 4

            [metrics]
            textfile = "out/etl.prom"
            "#,
        )
        .unwrap();
        assert_eq!(config.imputation.forest_trees, 10);
        assert_eq!(config.imputation.random_seed, 42);
        assert_eq!(config.imputation.forest_params().max_depth, Some(4));
        assert_eq!(config.metrics.textfile, Some(PathBuf::from("out/etl.prom")));
        assert_eq!(config.storage.database_path, PathBuf::from("employees.db"));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.imputation.forest_trees = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.clean_table = "employee data".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.storage.clean_table = config.storage.staging_table.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.storage.clean_table, "employee_data");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(matches!(Config::from_toml("[source"), Err(EtlError::Toml(_))));
    }
}

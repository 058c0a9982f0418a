/// Column names shared by the CSV source, the staging table and the clean table.
/// The raw and clean schemas use the same header set.
pub const COL_NAME: &str = "Name";
pub const COL_DEPARTMENT: &str = "Department";
pub const COL_DATE_OF_JOINING: &str = "Date of Joining";
pub const COL_COUNTRY: &str = "Country";
pub const COL_EXPERIENCE: &str = "Years of Experience";
pub const COL_SALARY: &str = "Salary";
pub const COL_PERFORMANCE: &str = "Performance Rating";

/// All columns in source order
pub const COLUMNS: [&str; 7] = [
    COL_NAME,
    COL_DEPARTMENT,
    COL_DATE_OF_JOINING,
    COL_COUNTRY,
    COL_EXPERIENCE,
    COL_SALARY,
    COL_PERFORMANCE,
];

// Sentinels produced by the field normalizers
pub const UNKNOWN_NAME: &str = "Unknown Name";
pub const UNKNOWN: &str = "Unknown";

// Default locations, overridable through config.toml or the environment
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const DEFAULT_CSV_PATH: &str = "data/employee_data_source.csv";
pub const DEFAULT_DATABASE_PATH: &str = "employees.db";
pub const DEFAULT_STAGING_TABLE: &str = "employee_data_source";
pub const DEFAULT_CLEAN_TABLE: &str = "employee_data";

pub const ENV_CONFIG_PATH: &str = "EMPLOYEE_ETL_CONFIG";
pub const ENV_SOURCE_PATH: &str = "EMPLOYEE_ETL_SOURCE";
pub const ENV_DATABASE_PATH: &str = "EMPLOYEE_ETL_DATABASE";

// Forest classifier defaults
pub const DEFAULT_FOREST_TREES: usize = 100;
pub const DEFAULT_RANDOM_SEED: u64 = 42;

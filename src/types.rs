use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::impute::experience::DEFAULT_EXPERIENCE_YEARS;
use crate::pipeline::normalize::format_iso_date;

/// One employee row exactly as supplied by the record source.
/// Blank cells are `None`; numeric cells that fail to parse are `None` too.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(rename = "Name", default)]
    pub name: Option<String>,
    #[serde(rename = "Department", default)]
    pub department: Option<String>,
    #[serde(rename = "Date of Joining", default)]
    pub date_of_joining: Option<String>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
    #[serde(
        rename = "Years of Experience",
        default,
        deserialize_with = "csv::invalid_option"
    )]
    pub experience_years: Option<f64>,
    #[serde(rename = "Salary", default, deserialize_with = "csv::invalid_option")]
    pub salary: Option<f64>,
    #[serde(rename = "Performance Rating", default)]
    pub performance_rating: Option<String>,
}

impl RawRecord {
    /// Identity used for duplicate detection. Floats compare by bit pattern so
    /// the key can be hashed.
    pub fn dedup_key(&self) -> RawRecordKey {
        RawRecordKey {
            text: [
                self.name.clone(),
                self.department.clone(),
                self.date_of_joining.clone(),
                self.country.clone(),
                self.performance_rating.clone(),
            ],
            numbers: [
                self.experience_years.map(f64::to_bits),
                self.salary.map(f64::to_bits),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawRecordKey {
    text: [Option<String>; 5],
    numbers: [Option<u64>; 2],
}

/// Ordered performance categories with their fixed integer codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PerformanceCategory {
    #[serde(rename = "Low Performers")]
    Low,
    #[serde(rename = "Average Performers")]
    Average,
    #[serde(rename = "High Performers")]
    High,
    #[serde(rename = "Top Performers")]
    Top,
}

impl PerformanceCategory {
    pub const ALL: [PerformanceCategory; 4] = [
        PerformanceCategory::Low,
        PerformanceCategory::Average,
        PerformanceCategory::High,
        PerformanceCategory::Top,
    ];

    /// Category assigned when there is not enough training data to predict one
    pub const DEFAULT: PerformanceCategory = PerformanceCategory::Average;

    pub fn code(self) -> usize {
        match self {
            PerformanceCategory::Low => 0,
            PerformanceCategory::Average => 1,
            PerformanceCategory::High => 2,
            PerformanceCategory::Top => 3,
        }
    }

    pub fn from_code(code: usize) -> Option<Self> {
        Self::ALL.get(code).copied()
    }

    /// Short name, e.g. "Average"
    pub fn short_name(self) -> &'static str {
        match self {
            PerformanceCategory::Low => "Low",
            PerformanceCategory::Average => "Average",
            PerformanceCategory::High => "High",
            PerformanceCategory::Top => "Top",
        }
    }

    /// Label stored in the clean table, e.g. "Average Performers"
    pub fn label(self) -> &'static str {
        match self {
            PerformanceCategory::Low => "Low Performers",
            PerformanceCategory::Average => "Average Performers",
            PerformanceCategory::High => "High Performers",
            PerformanceCategory::Top => "Top Performers",
        }
    }

    /// Parse either the short name or the full label, ignoring case and
    /// surrounding whitespace. Anything else is treated as missing.
    pub fn parse(value: &str) -> Option<Self> {
        let wanted = value.trim();
        Self::ALL.into_iter().find(|category| {
            wanted.eq_ignore_ascii_case(category.short_name())
                || wanted.eq_ignore_ascii_case(category.label())
        })
    }
}

impl fmt::Display for PerformanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A record moving through normalization and imputation.
/// `experience_years` and `performance_category` start out optional and are
/// filled in by the imputers.
#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    pub name: String,
    pub department: String,
    pub join_date: Option<NaiveDate>,
    pub country: String,
    pub experience_years: Option<f64>,
    pub salary: Option<f64>,
    pub performance_category: Option<PerformanceCategory>,
}

impl EmployeeRecord {
    /// Join date as seconds since the Unix epoch at midnight UTC
    pub fn join_date_secs(&self) -> Option<f64> {
        self.join_date
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp() as f64)
    }

    /// Convert into the output row. The imputers populate both optional
    /// fields; a record that bypassed them gets the same fallbacks they use.
    pub fn into_clean(self) -> CleanRecord {
        CleanRecord {
            name: self.name,
            department: self.department,
            date_of_joining: self.join_date.as_ref().map(format_iso_date),
            country: self.country,
            experience_years: self.experience_years.unwrap_or(DEFAULT_EXPERIENCE_YEARS),
            salary: self.salary,
            performance_rating: self.performance_category.unwrap_or(PerformanceCategory::DEFAULT),
        }
    }
}

/// Final output row written to the clean table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Department")]
    pub department: String,
    #[serde(rename = "Date of Joining")]
    pub date_of_joining: Option<String>,
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Years of Experience")]
    pub experience_years: f64,
    #[serde(rename = "Salary")]
    pub salary: Option<f64>,
    #[serde(rename = "Performance Rating")]
    pub performance_rating: PerformanceCategory,
}

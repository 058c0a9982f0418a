//! Field normalizers.
//!
//! Each function takes one raw cell (possibly absent or blank) and returns its
//! canonical form. They never fail: irregular input maps to a sentinel.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::constants::{UNKNOWN, UNKNOWN_NAME};
use crate::types::{EmployeeRecord, PerformanceCategory, RawRecord};

/// Lower-cased aliases and misspellings mapped to canonical department labels
static DEPARTMENT_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("h r", "HR"),
        ("hr", "HR"),
        ("cust support", "Customer Support"),
        ("customer support", "Customer Support"),
        ("it", "IT"),
        ("i t", "IT"),
        ("finance", "Finance"),
        ("marketing", "Marketing"),
        ("sales", "Sales"),
        ("legal", "Legal"),
        ("logistics", "Logistics"),
        ("operations", "Operations"),
        ("unknown", "Unknown"),
    ])
});

/// Date-only layouts, tried in order. Month-first comes before day-first.
/// Two-digit year layouts must come before any slash layout using `%Y`, which
/// accepts one to four digits and would read "20" as the year 20.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%d/%m/%y",
    "%d/%m/%Y",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Upper-case the first character and lower-case the rest
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Upper-case every letter that follows a non-letter, lower-case the others
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_alpha = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn normalize_name(value: Option<&str>) -> String {
    match present(value) {
        Some(name) => name.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" "),
        None => UNKNOWN_NAME.to_string(),
    }
}

/// Unrecognized departments are kept, only title-cased
pub fn normalize_department(value: Option<&str>) -> String {
    let Some(department) = present(value) else {
        return UNKNOWN.to_string();
    };
    let key = department.to_lowercase();
    match DEPARTMENT_ALIASES.get(key.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => title_case(&key),
    }
}

pub fn normalize_date(value: Option<&str>) -> Option<NaiveDate> {
    let raw = present(value)?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                .map(|dt| dt.date())
        })
}

pub fn format_iso_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn normalize_country(value: Option<&str>) -> String {
    match present(value) {
        Some(country) => capitalize(country),
        None => UNKNOWN.to_string(),
    }
}

/// Apply all field normalizers to one raw row
pub fn normalize_record(raw: &RawRecord) -> EmployeeRecord {
    EmployeeRecord {
        name: normalize_name(raw.name.as_deref()),
        department: normalize_department(raw.department.as_deref()),
        join_date: normalize_date(raw.date_of_joining.as_deref()),
        country: normalize_country(raw.country.as_deref()),
        experience_years: raw.experience_years.filter(|v| v.is_finite()),
        salary: raw.salary,
        performance_category: raw
            .performance_rating
            .as_deref()
            .and_then(PerformanceCategory::parse),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name(Some(" john DOE ")), "John Doe");
        assert_eq!(normalize_name(Some("mary   ann\tsmith")), "Mary Ann Smith");
        assert_eq!(normalize_name(None), "Unknown Name");
        assert_eq!(normalize_name(Some("   ")), "Unknown Name");
    }

    #[test]
    fn test_normalize_name_never_empty_or_padded() {
        for input in ["", " ", "a", " b ", "\t\n", "ÉLISE  dupont", "o'neil"] {
            let out = normalize_name(Some(input));
            assert!(!out.is_empty());
            assert_eq!(out, out.trim());
        }
        assert_eq!(normalize_name(Some("ÉLISE  dupont")), "Élise Dupont");
        assert_eq!(normalize_name(Some("o'NEIL")), "O'neil");
    }

    #[test]
    fn test_normalize_department_aliases() {
        assert_eq!(normalize_department(Some("h r")), "HR");
        assert_eq!(normalize_department(Some("  I T ")), "IT");
        assert_eq!(normalize_department(Some("Cust Support")), "Customer Support");
        assert_eq!(normalize_department(Some("FINANCE")), "Finance");
        assert_eq!(normalize_department(Some("unknown")), "Unknown");
    }

    #[test]
    fn test_normalize_department_fallback() {
        assert_eq!(normalize_department(Some("Fin")), "Fin");
        assert_eq!(normalize_department(Some("fin")), "Fin");
        assert_eq!(normalize_department(Some("Fin ance")), "Fin Ance");
        assert_eq!(normalize_department(Some("research and DEVELOPMENT")), "Research And Development");
        assert_eq!(normalize_department(Some("r&d")), "R&D");
        assert_eq!(normalize_department(None), "Unknown");
        assert_eq!(normalize_department(Some("")), "Unknown");
    }

    #[test]
    fn test_unmapped_department_is_title_cased() {
        assert_eq!(normalize_department(Some("procurement")), "Procurement");
        assert_eq!(normalize_department(Some("Fin.")), "Fin.");
    }

    #[test]
    fn test_normalize_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2020, 3, 5);
        assert_eq!(normalize_date(Some("03/05/2020")), expected);
        assert_eq!(normalize_date(Some("2020-03-05")), expected);
        assert_eq!(normalize_date(Some("2020/03/05")), expected);
        assert_eq!(normalize_date(Some("March 5, 2020")), expected);
        assert_eq!(normalize_date(Some("5 Mar 2020")), expected);
        assert_eq!(normalize_date(Some("2020-03-05 14:30:00")), expected);
        assert_eq!(normalize_date(Some("2020-03-05T14:30:00Z")), expected);
        assert_eq!(normalize_date(Some("03/05/20")), expected);
        // Only valid as day-first
        assert_eq!(normalize_date(Some("25/12/2019")), NaiveDate::from_ymd_opt(2019, 12, 25));
    }

    #[test]
    fn test_normalize_date_failures_are_none() {
        assert_eq!(normalize_date(Some("not-a-date")), None);
        assert_eq!(normalize_date(Some("2020-13-45")), None);
        assert_eq!(normalize_date(Some("")), None);
        assert_eq!(normalize_date(None), None);
    }

    #[test]
    fn test_format_iso_date() {
        let date = normalize_date(Some("03/05/2020")).unwrap();
        assert_eq!(format_iso_date(&date), "2020-03-05");
    }

    #[test]
    fn test_normalize_country() {
        assert_eq!(normalize_country(Some(" GERMANY ")), "Germany");
        assert_eq!(normalize_country(Some("united states")), "United states");
        assert_eq!(normalize_country(None), "Unknown");
        assert_eq!(normalize_country(Some("  ")), "Unknown");
    }

    #[test]
    fn test_normalize_record_keeps_numbers_and_parses_rating() {
        let raw = RawRecord {
            name: Some("jane roe".into()),
            department: Some("hr".into()),
            date_of_joining: Some("garbage".into()),
            country: Some("india".into()),
            experience_years: Some(4.0),
            salary: Some(52000.0),
            performance_rating: Some("High Performers".into()),
        };
        let record = normalize_record(&raw);
        assert_eq!(record.name, "Jane Roe");
        assert_eq!(record.department, "HR");
        assert_eq!(record.join_date, None);
        assert_eq!(record.country, "India");
        assert_eq!(record.experience_years, Some(4.0));
        assert_eq!(record.salary, Some(52000.0));
        assert_eq!(record.performance_category, Some(PerformanceCategory::High));
    }

    #[test]
    fn test_unrecognized_rating_is_missing() {
        let raw = RawRecord {
            performance_rating: Some("Stellar".into()),
            ..Default::default()
        };
        assert_eq!(normalize_record(&raw).performance_category, None);
    }
}

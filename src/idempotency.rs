use sha2::{Digest, Sha256};

use crate::types::CleanRecord;

/// Digest of a clean record set. Two runs over the same input with the same
/// seed must produce the same value.
pub fn compute_output_digest(records: &[CleanRecord]) -> String {
    let mut hasher = Sha256::new();
    for record in records {
        hasher.update(canonical_row(record).as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

// Simple canonical string; floats by bit pattern so -0.0 and 0.0 differ
fn canonical_row(record: &CleanRecord) -> String {
    let mut s = String::new();
    s.push_str(&record.name);
    s.push('|');
    s.push_str(&record.department);
    s.push('|');
    if let Some(d) = &record.date_of_joining { s.push_str(d); }
    s.push('|');
    s.push_str(&record.country);
    s.push('|');
    s.push_str(&format!("{:016x}", record.experience_years.to_bits()));
    s.push('|');
    if let Some(salary) = record.salary { s.push_str(&format!("{:016x}", salary.to_bits())); }
    s.push('|');
    s.push_str(record.performance_rating.label());
    s
}

//! Label encoding for categorical string columns.
//!
//! Labels are sorted before codes are assigned, so the mapping only depends on
//! the set of labels seen and not on row order.

use super::ModelError;
use std::collections::{BTreeSet, HashMap};

/// Fitted bijection between string labels and integer codes
#[derive(Debug, Clone, Default)]
pub struct LabelEncoder {
    /// Unique labels in sorted order; the index is the code
    classes: Vec<String>,
    class_to_idx: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Fit the encoder on every label the caller will later need to encode
    pub fn fit<'a, I>(labels: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let classes: Vec<String> = labels
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect();

        let class_to_idx = classes
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();

        Self {
            classes,
            class_to_idx,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn transform(&self, label: &str) -> Result<usize, ModelError> {
        self.class_to_idx
            .get(label)
            .copied()
            .ok_or_else(|| ModelError::UnknownLabel(label.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_follow_sorted_order() {
        let encoder = LabelEncoder::fit(["Sales", "HR", "IT", "HR"]);
        assert_eq!(encoder.classes(), &["HR", "IT", "Sales"]);
        assert_eq!(encoder.transform("HR"), Ok(0));
        assert_eq!(encoder.transform("IT"), Ok(1));
        assert_eq!(encoder.transform("Sales"), Ok(2));
    }

    #[test]
    fn test_codes_are_a_bijection() {
        let encoder = LabelEncoder::fit(["Germany", "India", "Canada"]);
        for (expected, class) in encoder.classes().iter().enumerate() {
            assert_eq!(encoder.transform(class), Ok(expected));
        }
        assert_eq!(encoder.classes().len(), 3);
    }

    #[test]
    fn test_unknown_label_is_an_error() {
        let encoder = LabelEncoder::fit(["HR"]);
        assert_eq!(
            encoder.transform("Legal"),
            Err(ModelError::UnknownLabel("Legal".to_string()))
        );
    }
}

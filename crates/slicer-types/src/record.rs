use serde::{Deserialize, Serialize};

use crate::Cell;

/// Formatted value of one breakdown dimension for a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownValue {
    /// Dimension key (`"<property> - <position>"`)
    pub key: String,
    /// Display label after granularity formatting
    pub label: String,
    /// Cell as it came from the query, kept for chronological sorting
    pub raw: Cell,
}

/// One summarized (label, value) pair per distinct breakdown combination.
///
/// `index` is the record's position in the build that produced it. It is not
/// stable across rebuilds; selections must be re-resolved by `label`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateRecord {
    pub index: usize,
    pub label: String,
    pub value: f64,
    #[serde(default)]
    pub breakdown_values: Vec<BreakdownValue>,
    /// Prior-period value matched by label when comparison is active
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_value: Option<f64>,
}

impl AggregateRecord {
    pub fn new(index: usize, label: impl Into<String>, value: f64) -> Self {
        Self {
            index,
            label: label.into(),
            value,
            breakdown_values: Vec::new(),
            compare_value: None,
        }
    }

    pub fn breakdown_value(&self, key: &str) -> Option<&BreakdownValue> {
        self.breakdown_values.iter().find(|b| b.key == key)
    }

    /// Label of the dimension at `position` (0-based)
    pub fn breakdown_label(&self, position: usize) -> Option<&str> {
        self.breakdown_values
            .get(position)
            .map(|b| b.label.as_str())
    }
}

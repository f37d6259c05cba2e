use serde::{Deserialize, Serialize};

/// One bar of an inline mini-chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarEntry {
    pub label: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_value: Option<f64>,
}

/// A cell of a nested breakdown table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupCell {
    /// A non-leaf level value. `row_span` is a merged-cell instruction:
    /// `Some(n)` spans `n` physical rows, `Some(0)` means covered by the row above.
    Value {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row_span: Option<usize>,
    },
    /// The leaf level, rendered as a chart of the group's records
    Chart {
        dimension_key: String,
        entries: Vec<BarEntry>,
    },
}

impl GroupCell {
    pub fn value(value: impl Into<String>) -> Self {
        GroupCell::Value {
            value: value.into(),
            row_span: None,
        }
    }

    pub fn spanning(value: impl Into<String>, row_span: usize) -> Self {
        GroupCell::Value {
            value: value.into(),
            row_span: Some(row_span),
        }
    }

    pub fn row_span(&self) -> Option<usize> {
        match self {
            GroupCell::Value { row_span, .. } => *row_span,
            GroupCell::Chart { .. } => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            GroupCell::Value { value, .. } => Some(value),
            GroupCell::Chart { .. } => None,
        }
    }
}

/// One physical row of a nested breakdown table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchicalRow {
    /// Row identity derived from the group values
    pub key: String,
    /// One cell per breakdown level
    pub cells: Vec<GroupCell>,
}

impl HierarchicalRow {
    /// Row span carried by the first-level cell, if any
    pub fn first_row_span(&self) -> Option<usize> {
        self.cells.first().and_then(GroupCell::row_span)
    }
}

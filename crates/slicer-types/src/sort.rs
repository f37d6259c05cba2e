use serde::{Deserialize, Serialize};

use crate::Granularity;

/// Sort key of the aggregate value column
pub const VALUE_KEY: &str = "value";
/// Sort key of the joined record label
pub const LABEL_KEY: &str = "label";
/// Sort key of a series total ("Overall" column)
pub const TOTAL_KEY: &str = "total";
/// Sort key of the prior-period value
pub const COMPARE_VALUE_KEY: &str = "compare_value";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascend,
    #[default]
    Descend,
}

impl SortOrder {
    pub fn flipped(self) -> Self {
        match self {
            SortOrder::Ascend => SortOrder::Descend,
            SortOrder::Descend => SortOrder::Ascend,
        }
    }
}

/// How values of a sort column are compared
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortType {
    #[default]
    Numerical,
    Categorical,
    Datetime,
}

/// A sortable column as offered by a table header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortColumn {
    pub key: String,
    #[serde(rename = "type")]
    pub sort_type: SortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Granularity>,
}

impl SortColumn {
    pub fn new(key: impl Into<String>, sort_type: SortType) -> Self {
        Self {
            key: key.into(),
            sort_type,
            subtype: None,
        }
    }

    pub fn with_subtype(mut self, subtype: Option<Granularity>) -> Self {
        self.subtype = subtype;
        self
    }
}

/// Current sort of a table, owned by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SorterState {
    pub key: String,
    pub order: SortOrder,
    #[serde(rename = "type")]
    pub sort_type: SortType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<Granularity>,
}

impl SorterState {
    pub fn new(column: SortColumn, order: SortOrder) -> Self {
        Self {
            key: column.key,
            order,
            sort_type: column.sort_type,
            subtype: column.subtype,
        }
    }

    /// `value` descending, the default for tables without a datetime breakdown
    pub fn by_value() -> Self {
        Self::new(
            SortColumn::new(VALUE_KEY, SortType::Numerical),
            SortOrder::Descend,
        )
    }
}

impl Default for SorterState {
    fn default() -> Self {
        Self::by_value()
    }
}

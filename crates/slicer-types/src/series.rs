use serde::{Deserialize, Serialize};

use crate::{AggregateRecord, Cell};

/// Which period a series belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    #[default]
    Current,
    Comparison,
}

/// Value of one date bucket, keyed by its display label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketValue {
    pub label: String,
    pub value: f64,
}

/// An aggregate record extended with one value per time bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesRecord {
    #[serde(flatten)]
    pub record: AggregateRecord,
    pub period: Period,
    /// Chart slots, aligned with the owning set's categories
    pub data: Vec<f64>,
    /// Table cells, one per category in axis order
    pub buckets: Vec<BucketValue>,
    pub total: f64,
}

impl SeriesRecord {
    pub fn label(&self) -> &str {
        &self.record.label
    }

    pub fn bucket(&self, label: &str) -> Option<f64> {
        self.buckets
            .iter()
            .find(|b| b.label == label)
            .map(|b| b.value)
    }
}

/// All series of one period sharing a category axis
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    pub period: Period,
    /// Raw date cells in first-seen order
    pub categories: Vec<Cell>,
    /// Display labels of `categories`, same order
    pub category_labels: Vec<String>,
    pub series: Vec<SeriesRecord>,
    /// Sum of all series per category
    pub date_wise_totals: Vec<f64>,
}

impl SeriesSet {
    pub fn empty(period: Period) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn find(&self, label: &str) -> Option<&SeriesRecord> {
        self.series.iter().find(|s| s.label() == label)
    }
}

use serde::{Deserialize, Serialize};

/// Value of a presented table field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    /// Metric tracked against the comparison period
    Compared { value: f64, compare_value: f64 },
    /// Bookkeeping the table needs (row keys, indices) but a download must not carry
    Internal(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresentedField {
    pub column: String,
    pub value: FieldValue,
}

/// A row exactly as handed to the table collaborator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresentedRow {
    pub fields: Vec<PresentedField>,
}

impl PresentedRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: FieldValue) {
        self.fields.push(PresentedField {
            column: column.into(),
            value,
        });
    }

    pub fn field(&self, column: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.value)
    }
}

/// Date ranges shown in exported column titles
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportContext {
    pub current_range: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_range: Option<String>,
}

/// Flat, CSV-safe records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Value of `column` in row `row`
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }
}

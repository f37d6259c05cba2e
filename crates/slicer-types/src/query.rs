use serde::{Deserialize, Serialize};

use crate::BreakdownSpec;

/// A single cell of a query result row.
///
/// The backend emits a mix of JSON numbers, strings and nulls in the same
/// column, so cells stay loosely typed until a builder interprets them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Numeric view of the cell; numeric strings are coerced
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n),
            Cell::Number(_) => None,
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            Cell::Null => None,
        }
    }

    /// Raw string form used for labels and passthrough fallbacks
    pub fn to_raw_string(&self) -> String {
        match self {
            Cell::Number(n) => number_to_string(*n),
            Cell::Text(s) => s.clone(),
            Cell::Null => String::new(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Number(value as f64)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

/// Render a number the way the dashboard shows raw values:
/// integral values without a fractional part, infinities spelled out.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        if n > 0.0 {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else {
        format!("{}", n)
    }
}

/// Query metadata echoed back by the backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryMeta {
    #[serde(default)]
    pub query: QueryEcho,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryEcho {
    /// Breakdowns the query was issued with
    #[serde(default, alias = "gbp")]
    pub breakdowns: Vec<BreakdownSpec>,
}

/// Columnar result of one analytics query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub headers: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Vec<Cell>>,
    #[serde(default)]
    pub meta: QueryMeta,
}

impl QueryResult {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            headers,
            rows,
            meta: QueryMeta::default(),
        }
    }

    pub fn with_breakdowns(mut self, breakdowns: Vec<BreakdownSpec>) -> Self {
        self.meta.query.breakdowns = breakdowns;
        self
    }

    pub fn header_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() || self.rows.is_empty()
    }
}

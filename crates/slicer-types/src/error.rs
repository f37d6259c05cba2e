use std::fmt;

/// Result type for operations that can report a recovered issue
pub type Result<T> = std::result::Result<T, Issue>;

/// Conditions the engine recovers from locally.
///
/// None of these are fatal: builders fall back to an empty output, a raw
/// passthrough value or the caller's previous state. The variants exist so
/// the recovery can be logged and, where a caller asks for it, surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Issue {
    /// Missing or short headers/rows, or an unresolvable value column
    MalformedInput(String),
    /// A breakdown property has no matching header
    UnresolvableBreakdownColumn { property: String },
    /// The sorter references a field no record exposes
    InvalidSortKey { key: String },
    /// A manual selection outside `1..=cap`
    SelectionBoundsViolation { requested: usize, cap: usize },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::MalformedInput(reason) => write!(f, "Malformed input: {}", reason),
            Issue::UnresolvableBreakdownColumn { property } => {
                write!(f, "Breakdown column not found in headers: {}", property)
            }
            Issue::InvalidSortKey { key } => write!(f, "Invalid sort key: {}", key),
            Issue::SelectionBoundsViolation { requested, cap } => write!(
                f,
                "Selection of {} items is outside the allowed range 1..={}",
                requested, cap
            ),
        }
    }
}

impl std::error::Error for Issue {}

use slicer_types::{
    dimension_key, AggregateRecord, BreakdownSpec, BreakdownValue, Cell, Issue, PropType,
    SeriesRecord, SortColumn, SortOrder, SortType, SorterState, COMPARE_VALUE_KEY, LABEL_KEY,
    TOTAL_KEY, VALUE_KEY,
};
use std::borrow::Cow;
use std::cmp::Ordering;

use crate::format::GranularityFormatter;

/// A field exposed to the sorter
#[derive(Debug, Clone, Copy)]
pub enum FieldRef<'a> {
    Number(f64),
    Text(&'a str),
    Breakdown(&'a BreakdownValue),
}

/// Anything that can be sorted, windowed and searched by label
pub trait Sortable {
    fn label(&self) -> &str;

    /// Field addressed by a sort key; `None` if the record has no such field
    fn field(&self, key: &str) -> Option<FieldRef<'_>>;
}

impl Sortable for AggregateRecord {
    fn label(&self) -> &str {
        &self.label
    }

    fn field(&self, key: &str) -> Option<FieldRef<'_>> {
        match key {
            VALUE_KEY => Some(FieldRef::Number(self.value)),
            LABEL_KEY => Some(FieldRef::Text(&self.label)),
            COMPARE_VALUE_KEY => self.compare_value.map(FieldRef::Number),
            _ => self.breakdown_value(key).map(FieldRef::Breakdown),
        }
    }
}

impl Sortable for SeriesRecord {
    fn label(&self) -> &str {
        &self.record.label
    }

    fn field(&self, key: &str) -> Option<FieldRef<'_>> {
        if key == TOTAL_KEY {
            return Some(FieldRef::Number(self.total));
        }
        if let Some(value) = self.bucket(key) {
            return Some(FieldRef::Number(value));
        }
        self.record.field(key)
    }
}

/// Precomputed comparison key. `None` sorts as minimal.
#[derive(Debug)]
enum SortKey<'a> {
    Number(Option<f64>),
    Text(Option<Cow<'a, str>>),
    Instant(Option<i64>),
}

impl SortKey<'_> {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.total_cmp(b),
                _ => a.is_some().cmp(&b.is_some()),
            },
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            (SortKey::Instant(a), SortKey::Instant(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Type-aware stable sorter
#[derive(Debug, Clone, Copy)]
pub struct Sorter<'a> {
    formatter: &'a GranularityFormatter,
}

impl<'a> Sorter<'a> {
    pub fn new(formatter: &'a GranularityFormatter) -> Self {
        Self { formatter }
    }

    /// Return a stably sorted copy of `records`.
    ///
    /// Ties keep their input order in both directions. A key that no record
    /// exposes leaves the order untouched.
    pub fn sort<R: Sortable + Clone>(&self, records: &[R], sorter: &SorterState) -> Vec<R> {
        if !records.is_empty() && records.iter().all(|r| r.field(&sorter.key).is_none()) {
            let issue = Issue::InvalidSortKey {
                key: sorter.key.clone(),
            };
            tracing::debug!(%issue, "Leaving records in input order");
            return records.to_vec();
        }

        let mut keyed: Vec<(SortKey<'_>, &R)> = records
            .iter()
            .map(|r| (self.sort_key(r, sorter), r))
            .collect();

        keyed.sort_by(|(a, _), (b, _)| {
            let ordering = a.compare(b);
            match sorter.order {
                SortOrder::Ascend => ordering,
                SortOrder::Descend => ordering.reverse(),
            }
        });

        keyed.into_iter().map(|(_, r)| r.clone()).collect()
    }

    fn sort_key<'r, R: Sortable>(&self, record: &'r R, sorter: &SorterState) -> SortKey<'r> {
        let field = record.field(&sorter.key);
        match sorter.sort_type {
            SortType::Numerical => SortKey::Number(field.and_then(numeric_value)),
            SortType::Categorical => SortKey::Text(field.map(text_value)),
            SortType::Datetime => SortKey::Instant(field.and_then(|f| self.instant_value(f))),
        }
    }

    fn instant_value(&self, field: FieldRef<'_>) -> Option<i64> {
        let instant = match field {
            FieldRef::Breakdown(b) => self.formatter.parse_instant(&b.raw),
            FieldRef::Text(s) => self.formatter.parse_instant(&Cell::text(s)),
            FieldRef::Number(n) => self.formatter.parse_instant(&Cell::Number(n)),
        };
        instant.map(|dt| dt.timestamp_millis())
    }
}

fn numeric_value(field: FieldRef<'_>) -> Option<f64> {
    match field {
        FieldRef::Number(n) => Some(n).filter(|n| n.is_finite()),
        FieldRef::Text(s) => Cell::text(s).as_f64(),
        FieldRef::Breakdown(b) => b.raw.as_f64(),
    }
}

fn text_value(field: FieldRef<'_>) -> Cow<'_, str> {
    match field {
        FieldRef::Number(n) => Cow::Owned(slicer_types::number_to_string(n)),
        FieldRef::Text(s) => Cow::Borrowed(s),
        FieldRef::Breakdown(b) => Cow::Borrowed(&b.label),
    }
}

/// Sorter state after a click on `clicked`.
///
/// A new column starts descending; clicking the active column flips the
/// order. There is no way back to "unsorted".
pub fn next_sorter_state(current: &SorterState, clicked: SortColumn) -> SorterState {
    if current.key == clicked.key {
        SorterState {
            order: current.order.flipped(),
            ..current.clone()
        }
    } else {
        SorterState::new(clicked, SortOrder::Descend)
    }
}

/// Initial sort for a breakdown table: the first datetime breakdown newest
/// first, otherwise the value column descending.
pub fn default_sorter(breakdowns: &[BreakdownSpec]) -> SorterState {
    breakdowns
        .iter()
        .enumerate()
        .find(|(_, spec)| spec.prop_type == PropType::Datetime)
        .map(|(position, spec)| {
            SorterState::new(
                SortColumn::new(dimension_key(&spec.property, position), SortType::Datetime)
                    .with_subtype(spec.granularity),
                SortOrder::Descend,
            )
        })
        .unwrap_or_else(SorterState::by_value)
}

/// Case-insensitive label search
pub fn filter_by_label<R: Sortable + Clone>(records: &[R], search: &str) -> Vec<R> {
    let needle = search.to_lowercase();
    records
        .iter()
        .filter(|r| r.label().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use slicer_types::Granularity;

    fn record(index: usize, label: &str, value: f64) -> AggregateRecord {
        AggregateRecord::new(index, label, value)
    }

    fn labels(records: &[AggregateRecord]) -> Vec<&str> {
        records.iter().map(|r| r.label.as_str()).collect()
    }

    fn with_breakdown(mut record: AggregateRecord, key: &str, label: &str, raw: Cell) -> AggregateRecord {
        record.breakdown_values.push(BreakdownValue {
            key: key.to_string(),
            label: label.to_string(),
            raw,
        });
        record
    }

    #[test]
    fn test_numerical_descend_keeps_ties_in_order() {
        let formatter = GranularityFormatter::new(&EngineConfig::default());
        let records = vec![
            record(0, "a", 5.0),
            record(1, "b", 10.0),
            record(2, "c", 5.0),
            record(3, "d", 10.0),
        ];

        let sorted = Sorter::new(&formatter).sort(&records, &SorterState::by_value());
        assert_eq!(labels(&sorted), vec!["b", "d", "a", "c"]);

        let mut ascending = SorterState::by_value();
        ascending.order = SortOrder::Ascend;
        let sorted = Sorter::new(&formatter).sort(&records, &ascending);
        assert_eq!(labels(&sorted), vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn test_non_numeric_values_sort_as_minimal() {
        let formatter = GranularityFormatter::new(&EngineConfig::default());
        let key = "price - 0";
        let records = vec![
            with_breakdown(record(0, "x", 0.0), key, "x", Cell::text("n/a")),
            with_breakdown(record(1, "y", 0.0), key, "20", Cell::text("20")),
            with_breakdown(record(2, "z", 0.0), key, "3", Cell::Number(3.0)),
        ];
        let sorter = SorterState::new(SortColumn::new(key, SortType::Numerical), SortOrder::Ascend);

        let sorted = Sorter::new(&formatter).sort(&records, &sorter);
        assert_eq!(labels(&sorted), vec!["x", "z", "y"]);
    }

    #[test]
    fn test_categorical_is_case_sensitive() {
        let formatter = GranularityFormatter::new(&EngineConfig::default());
        let records = vec![record(0, "banana", 1.0), record(1, "Cherry", 1.0), record(2, "apple", 1.0)];
        let sorter = SorterState::new(SortColumn::new(LABEL_KEY, SortType::Categorical), SortOrder::Ascend);

        let sorted = Sorter::new(&formatter).sort(&records, &sorter);
        assert_eq!(labels(&sorted), vec!["Cherry", "apple", "banana"]);
    }

    #[test]
    fn test_datetime_sorts_by_instant_not_label() {
        let formatter = GranularityFormatter::new(&EngineConfig::default());
        let key = "$timestamp - 0";
        let records = vec![
            with_breakdown(record(0, "Q4, 2023", 1.0), key, "Q4, 2023", Cell::text("2023-10-01T00:00:00Z")),
            with_breakdown(record(1, "Q1, 2024", 1.0), key, "Q1, 2024", Cell::text("2024-01-01T00:00:00Z")),
            with_breakdown(record(2, "Q2, 2023", 1.0), key, "Q2, 2023", Cell::text("2023-04-01T00:00:00Z")),
        ];
        let sorter = SorterState::new(
            SortColumn::new(key, SortType::Datetime).with_subtype(Some(Granularity::Quarter)),
            SortOrder::Descend,
        );

        let sorted = Sorter::new(&formatter).sort(&records, &sorter);
        assert_eq!(labels(&sorted), vec!["Q1, 2024", "Q4, 2023", "Q2, 2023"]);
    }

    #[test]
    fn test_unknown_key_is_a_no_op() {
        let formatter = GranularityFormatter::new(&EngineConfig::default());
        let records = vec![record(0, "a", 1.0), record(1, "b", 2.0)];
        let sorter = SorterState::new(SortColumn::new("missing - 4", SortType::Numerical), SortOrder::Descend);

        let sorted = Sorter::new(&formatter).sort(&records, &sorter);
        assert_eq!(sorted, records);
    }

    #[test]
    fn test_next_sorter_state_transitions() {
        let current = SorterState::by_value();

        let flipped = next_sorter_state(&current, SortColumn::new(VALUE_KEY, SortType::Numerical));
        assert_eq!(flipped.order, SortOrder::Ascend);
        let flipped_back = next_sorter_state(&flipped, SortColumn::new(VALUE_KEY, SortType::Numerical));
        assert_eq!(flipped_back.order, SortOrder::Descend);

        let mut ascending = current.clone();
        ascending.order = SortOrder::Ascend;
        let switched = next_sorter_state(&ascending, SortColumn::new("country - 0", SortType::Categorical));
        assert_eq!(switched.key, "country - 0");
        assert_eq!(switched.order, SortOrder::Descend);
        assert_eq!(switched.sort_type, SortType::Categorical);
    }

    #[test]
    fn test_default_sorter_prefers_datetime_breakdown() {
        let specs = vec![
            BreakdownSpec::categorical("country"),
            BreakdownSpec::datetime("$timestamp", Granularity::Week),
        ];
        let sorter = default_sorter(&specs);
        assert_eq!(sorter.key, "$timestamp - 1");
        assert_eq!(sorter.sort_type, SortType::Datetime);
        assert_eq!(sorter.subtype, Some(Granularity::Week));

        assert_eq!(default_sorter(&specs[..1]), SorterState::by_value());
    }

    #[test]
    fn test_filter_by_label_ignores_case() {
        let records = vec![record(0, "India", 1.0), record(1, "US", 2.0), record(2, "indonesia", 3.0)];
        let found = filter_by_label(&records, "IND");
        assert_eq!(labels(&found), vec!["India", "indonesia"]);
    }
}

use slicer_types::{dimension_key, AggregateRecord, BarEntry, BreakdownSpec, GroupCell, HierarchicalRow};
use std::collections::HashMap;

/// Builds nested breakdown tables (1 to 3 levels) with row-span metadata
#[derive(Debug, Clone, Copy)]
pub struct HierarchicalGrouper {
    widget_entry_limit: usize,
}

impl HierarchicalGrouper {
    pub fn new(widget_entry_limit: usize) -> Self {
        Self { widget_entry_limit }
    }

    /// Group `records` by their breakdown levels.
    ///
    /// Records are ordered by value, highest first, before grouping; group
    /// order is the first appearance of each value in that order. In widget
    /// mode only the first physical row is returned.
    pub fn group(
        &self,
        records: &[AggregateRecord],
        specs: &[BreakdownSpec],
        widget: bool,
    ) -> Vec<HierarchicalRow> {
        let mut sorted: Vec<&AggregateRecord> = records.iter().collect();
        sorted.sort_by(|a, b| b.value.total_cmp(&a.value));

        let keys: Vec<String> = specs
            .iter()
            .enumerate()
            .map(|(position, spec)| dimension_key(&spec.property, position))
            .collect();

        let mut rows = match keys.len() {
            1 => vec![HierarchicalRow {
                key: "0".to_string(),
                cells: vec![self.chart_cell(&sorted, &keys[0], 0, widget)],
            }],
            2 => group_by_level(&sorted, 0)
                .into_iter()
                .map(|(first, members)| HierarchicalRow {
                    key: first.clone(),
                    cells: vec![
                        GroupCell::value(first),
                        self.chart_cell(&members, &keys[1], 1, widget),
                    ],
                })
                .collect(),
            3 => {
                let mut rows = Vec::new();
                for (first, members) in group_by_level(&sorted, 0) {
                    let second_level = group_by_level(&members, 1);
                    let span = second_level.len();
                    for (i, (second, leaves)) in second_level.into_iter().enumerate() {
                        rows.push(HierarchicalRow {
                            key: format!("{}{}{}{}", first, keys[0], second, keys[1]),
                            cells: vec![
                                GroupCell::spanning(first.clone(), if i == 0 { span } else { 0 }),
                                GroupCell::value(second),
                                self.chart_cell(&leaves, &keys[2], 2, widget),
                            ],
                        });
                    }
                }
                rows
            }
            arity => {
                tracing::debug!(arity, "Nested tables need 1 to 3 breakdowns");
                Vec::new()
            }
        };

        if widget {
            rows.truncate(1);
            // The kept row is the whole group now
            if let Some(GroupCell::Value {
                row_span: Some(span),
                ..
            }) = rows.first_mut().and_then(|r| r.cells.first_mut())
            {
                *span = 1;
            }
        }
        rows
    }

    fn chart_cell(
        &self,
        records: &[&AggregateRecord],
        dimension_key: &str,
        position: usize,
        widget: bool,
    ) -> GroupCell {
        let mut entries: Vec<BarEntry> = records
            .iter()
            .map(|r| BarEntry {
                label: r
                    .breakdown_label(position)
                    .unwrap_or(r.label.as_str())
                    .to_string(),
                value: r.value,
                compare_value: r.compare_value,
            })
            .collect();
        if widget {
            entries.truncate(self.widget_entry_limit);
        }
        GroupCell::Chart {
            dimension_key: dimension_key.to_string(),
            entries,
        }
    }
}

/// Partition by the label at `position`, keeping first-appearance order
fn group_by_level<'r>(
    records: &[&'r AggregateRecord],
    position: usize,
) -> Vec<(String, Vec<&'r AggregateRecord>)> {
    let mut groups: Vec<(String, Vec<&'r AggregateRecord>)> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();

    for record in records {
        let value = record.breakdown_label(position).unwrap_or_default().to_string();
        match slots.get(&value) {
            Some(&slot) => groups[slot].1.push(record),
            None => {
                slots.insert(value.clone(), groups.len());
                groups.push((value, vec![*record]));
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_types::{BreakdownValue, Cell};

    fn record(index: usize, levels: &[&str], value: f64) -> AggregateRecord {
        let mut record = AggregateRecord::new(index, levels.join(", "), value);
        record.breakdown_values = levels
            .iter()
            .enumerate()
            .map(|(i, level)| BreakdownValue {
                key: format!("p{} - {}", i, i),
                label: level.to_string(),
                raw: Cell::text(*level),
            })
            .collect();
        record
    }

    fn specs(n: usize) -> Vec<BreakdownSpec> {
        (0..n).map(|i| BreakdownSpec::categorical(format!("p{}", i))).collect()
    }

    fn entry_labels(cell: &GroupCell) -> Vec<String> {
        match cell {
            GroupCell::Chart { entries, .. } => entries.iter().map(|e| e.label.clone()).collect(),
            GroupCell::Value { .. } => panic!("expected a chart cell"),
        }
    }

    #[test]
    fn test_single_dimension_wraps_everything() {
        let records = vec![record(0, &["IN"], 10.0), record(1, &["US"], 20.0)];
        let rows = HierarchicalGrouper::new(3).group(&records, &specs(1), false);

        assert_eq!(rows.len(), 1);
        assert_eq!(entry_labels(&rows[0].cells[0]), vec!["US", "IN"]);
    }

    #[test]
    fn test_two_dimensions_one_row_per_first_value() {
        let records = vec![
            record(0, &["IN", "chrome"], 5.0),
            record(1, &["US", "chrome"], 30.0),
            record(2, &["IN", "safari"], 8.0),
            record(3, &["US", "firefox"], 2.0),
        ];
        let rows = HierarchicalGrouper::new(3).group(&records, &specs(2), false);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells[0].text(), Some("US"));
        assert_eq!(entry_labels(&rows[0].cells[1]), vec!["chrome", "firefox"]);
        assert_eq!(rows[1].cells[0].text(), Some("IN"));
        assert_eq!(entry_labels(&rows[1].cells[1]), vec!["safari", "chrome"]);
        assert_eq!(rows[0].first_row_span(), None);
    }

    #[test]
    fn test_widget_mode_keeps_first_row_and_top_entries() {
        let records = vec![
            record(0, &["US", "a"], 9.0),
            record(1, &["US", "b"], 8.0),
            record(2, &["US", "c"], 7.0),
            record(3, &["US", "d"], 6.0),
            record(4, &["IN", "a"], 1.0),
        ];
        let rows = HierarchicalGrouper::new(3).group(&records, &specs(2), true);

        assert_eq!(rows.len(), 1);
        assert_eq!(entry_labels(&rows[0].cells[1]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_widget_mode_three_levels_spans_one_row() {
        let records = vec![
            record(0, &["A", "x", "chrome"], 50.0),
            record(1, &["A", "y", "chrome"], 40.0),
            record(2, &["A", "x", "safari"], 35.0),
            record(3, &["B", "z", "chrome"], 30.0),
        ];
        let rows = HierarchicalGrouper::new(3).group(&records, &specs(3), true);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].first_row_span(), Some(1));
        assert_eq!(rows[0].cells[0].text(), Some("A"));
        assert_eq!(entry_labels(&rows[0].cells[2]), vec!["chrome", "safari"]);
        slicer_testing::assertions::assert_row_spans_consistent(&rows).unwrap();
    }

    #[test]
    fn test_unsupported_arity_is_empty() {
        let records = vec![record(0, &[], 1.0)];
        assert!(HierarchicalGrouper::new(3).group(&records, &specs(0), false).is_empty());
        assert!(HierarchicalGrouper::new(3).group(&records, &specs(4), false).is_empty());
    }
}

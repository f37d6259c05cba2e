use anyhow::Result;
use serde_json::json;
use slicer_types::{
    number_to_string, AggregateRecord, BreakdownSpec, ExportContext, ExportTable, FieldValue,
    PresentedRow, SeriesSet,
};
use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Column of the per-series total in date tables
pub const OVERALL_COLUMN: &str = "Overall";

const DEFAULT_COMPARE_RANGE: &str = "Previous Period";

/// Percentage change from `compare_value` to `value`.
///
/// One decimal, dropped when it is zero; `Infinity` when only the prior
/// value is zero.
pub fn percent_change(value: f64, compare_value: f64) -> String {
    if compare_value == 0.0 {
        return if value == 0.0 {
            "0%".to_string()
        } else {
            "Infinity".to_string()
        };
    }

    let change = ((value - compare_value) / compare_value) * 100.0;
    // Adding 0.0 turns -0.0 into 0.0
    let rounded = (change * 10.0).round() / 10.0 + 0.0;
    if rounded.fract() == 0.0 {
        format!("{:.0}%", rounded)
    } else {
        format!("{:.1}%", rounded)
    }
}

/// Flatten presented rows into string columns.
///
/// Columns appear in first-seen order across all rows; a row missing a
/// column gets an empty string. Internal fields are dropped and compared
/// fields expand into current, prior and change columns.
pub fn flatten(rows: &[PresentedRow], ctx: &ExportContext) -> ExportTable {
    let compare_range = ctx.compare_range.as_deref().unwrap_or(DEFAULT_COMPARE_RANGE);
    let mut columns: Vec<String> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut flat_rows: Vec<Vec<(usize, String)>> = Vec::with_capacity(rows.len());

    let mut slot = |column: String, columns: &mut Vec<String>| -> usize {
        *slots.entry(column.clone()).or_insert_with(|| {
            columns.push(column);
            columns.len() - 1
        })
    };

    for row in rows {
        let mut cells = Vec::new();
        for field in &row.fields {
            match &field.value {
                FieldValue::Internal(_) => {}
                FieldValue::Text(text) => {
                    cells.push((slot(field.column.clone(), &mut columns), text.clone()));
                }
                FieldValue::Number(n) => {
                    cells.push((slot(field.column.clone(), &mut columns), number_to_string(*n)));
                }
                FieldValue::Compared {
                    value,
                    compare_value,
                } => {
                    let current = format!("{} ({})", field.column, ctx.current_range);
                    let prior = format!("{} ({})", field.column, compare_range);
                    let change = format!("{} Change", field.column);
                    cells.push((slot(current, &mut columns), number_to_string(*value)));
                    cells.push((slot(prior, &mut columns), number_to_string(*compare_value)));
                    cells.push((
                        slot(change, &mut columns),
                        percent_change(*value, *compare_value),
                    ));
                }
            }
        }
        flat_rows.push(cells);
    }

    let rows = flat_rows
        .into_iter()
        .map(|cells| {
            let mut out = vec![String::new(); columns.len()];
            for (index, text) in cells {
                out[index] = text;
            }
            out
        })
        .collect();

    ExportTable { columns, rows }
}

/// Column titles for breakdowns; a repeated property gets a numeric suffix
pub fn breakdown_titles(specs: &[BreakdownSpec]) -> Vec<String> {
    unique_titles(specs.iter().map(|s| s.property.clone()))
}

fn unique_titles(titles: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    titles
        .into_iter()
        .map(|title| {
            let count = counts.entry(title.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                title
            } else {
                format!("{} ({})", title, count)
            }
        })
        .collect()
}

/// Presented rows of an aggregate table: breakdown labels, then the metric
pub fn aggregate_table_rows(
    records: &[AggregateRecord],
    specs: &[BreakdownSpec],
    metric: &str,
    comparison: bool,
) -> Vec<PresentedRow> {
    let titles = breakdown_titles(specs);

    records
        .iter()
        .map(|record| {
            let mut row = PresentedRow::new();
            row.push("index", FieldValue::Internal(json!(record.index)));
            for (position, title) in titles.iter().enumerate() {
                let label = record.breakdown_label(position).unwrap_or_default();
                row.push(title.as_str(), FieldValue::Text(label.to_string()));
            }
            let value = if comparison {
                FieldValue::Compared {
                    value: record.value,
                    compare_value: record.compare_value.unwrap_or(0.0),
                }
            } else {
                FieldValue::Number(record.value)
            };
            row.push(metric, value);
            row
        })
        .collect()
}

/// Presented rows of a date table.
///
/// Current buckets come first, then the comparison buckets when a
/// comparison set is given. Only the `Overall` total is compared.
pub fn date_table_rows(
    current: &SeriesSet,
    comparison: Option<&SeriesSet>,
    specs: &[BreakdownSpec],
    metric: &str,
) -> Vec<PresentedRow> {
    let titles = breakdown_titles(specs);
    let bucket_titles = unique_titles(
        current
            .category_labels
            .iter()
            .chain(comparison.into_iter().flat_map(|set| set.category_labels.iter()))
            .cloned(),
    );
    let (current_titles, compare_titles) = bucket_titles.split_at(current.category_labels.len());

    current
        .series
        .iter()
        .map(|series| {
            let mut row = PresentedRow::new();
            row.push("index", FieldValue::Internal(json!(series.record.index)));
            if titles.is_empty() {
                row.push("Event", FieldValue::Text(metric.to_string()));
            }
            for (position, title) in titles.iter().enumerate() {
                let label = series.record.breakdown_label(position).unwrap_or_default();
                row.push(title.as_str(), FieldValue::Text(label.to_string()));
            }
            for (title, value) in current_titles.iter().zip(&series.data) {
                row.push(title.as_str(), FieldValue::Number(*value));
            }

            let overall = match comparison {
                Some(set) => {
                    let prior = set.find(series.label());
                    for (slot, title) in compare_titles.iter().enumerate() {
                        let value = prior.and_then(|p| p.data.get(slot)).copied().unwrap_or(0.0);
                        row.push(title.as_str(), FieldValue::Number(value));
                    }
                    FieldValue::Compared {
                        value: series.total,
                        compare_value: prior.map(|p| p.total).unwrap_or(0.0),
                    }
                }
                None => FieldValue::Number(series.total),
            };
            row.push(OVERALL_COLUMN, overall);
            row
        })
        .collect()
}

/// Write `table` as CSV, header row first
pub fn write_csv<W: io::Write>(writer: W, table: &ExportTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(&table.columns)?;
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_file(path: &Path, table: &ExportTable) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(file, table)
}

pub fn to_csv_string(table: &ExportTable) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(&mut buf, table)?;
    Ok(String::from_utf8(buf)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(120.0, 100.0), "20%");
        assert_eq!(percent_change(50.0, 0.0), "Infinity");
        assert_eq!(percent_change(0.0, 0.0), "0%");
        assert_eq!(percent_change(80.0, 100.0), "-20%");
        assert_eq!(percent_change(1.0, 3.0), "-66.7%");
        assert_eq!(percent_change(100.04, 100.0), "0%");
        assert_eq!(percent_change(99.96, 100.0), "0%");
    }

    #[test]
    fn test_percent_change_does_not_saturate() {
        let huge = percent_change(1e20, 1.0);
        assert!(huge.ends_with('%'));
        assert!(!huge.contains('.'));
        let magnitude: f64 = huge.trim_end_matches('%').parse().unwrap();
        assert!(magnitude > 9.9e21);
        assert_eq!(percent_change(-1e20, 1.0).chars().next(), Some('-'));
    }

    #[test]
    fn test_flatten_drops_internal_and_expands_compared() {
        let mut row = PresentedRow::new();
        row.push("index", FieldValue::Internal(json!(0)));
        row.push("country", FieldValue::Text("US".into()));
        row.push(
            "Signups",
            FieldValue::Compared {
                value: 120.0,
                compare_value: 100.0,
            },
        );
        let ctx = ExportContext {
            current_range: "Mar 1 - Mar 7".into(),
            compare_range: Some("Feb 23 - Feb 29".into()),
        };

        let table = flatten(&[row], &ctx);
        assert_eq!(
            table.columns,
            vec![
                "country",
                "Signups (Mar 1 - Mar 7)",
                "Signups (Feb 23 - Feb 29)",
                "Signups Change"
            ]
        );
        assert_eq!(table.rows, vec![vec!["US", "120", "100", "20%"]]);
    }

    #[test]
    fn test_flatten_fills_missing_columns() {
        let mut first = PresentedRow::new();
        first.push("a", FieldValue::Number(1.0));
        let mut second = PresentedRow::new();
        second.push("b", FieldValue::Number(2.5));

        let table = flatten(&[first, second], &ExportContext::default());
        assert_eq!(table.columns, vec!["a", "b"]);
        assert_eq!(table.rows, vec![vec!["1", ""], vec!["", "2.5"]]);
    }

    #[test]
    fn test_duplicate_breakdown_titles_are_suffixed() {
        let specs = vec![
            BreakdownSpec::categorical("$browser"),
            BreakdownSpec::categorical("$os"),
            BreakdownSpec::categorical("$browser"),
        ];
        assert_eq!(breakdown_titles(&specs), vec!["$browser", "$os", "$browser (2)"]);
    }

    #[test]
    fn test_csv_quotes_separators() {
        let table = ExportTable {
            columns: vec!["label".into(), "count".into()],
            rows: vec![vec!["US, chrome".into(), "3".into()]],
        };
        assert_eq!(to_csv_string(&table).unwrap(), "label,count\n\"US, chrome\",3\n");
    }

    #[test]
    fn test_write_csv_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let table = ExportTable {
            columns: vec!["a".into()],
            rows: vec![vec!["1".into()]],
        };
        write_csv_file(&path, &table).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "a\n1\n");
    }
}

use serde::{Deserialize, Serialize};
use slicer_types::{
    dimension_key, AggregateRecord, BreakdownSpec, BreakdownValue, Cell, Issue, QueryResult,
};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::format::GranularityFormatter;

/// How the value column of a result is located.
///
/// Events and profile results name their value column; KPI and funnel
/// results carry several metric blocks after the breakdown columns and are
/// addressed by position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ValueColumn {
    /// First header found, trying names in priority order
    Named { priority: Vec<String> },
    /// Column `first + stride * metric`, counted from the end of the breakdown columns
    Block {
        first: usize,
        stride: usize,
        metric: usize,
    },
}

impl ValueColumn {
    pub fn named(priority: &[String]) -> Self {
        ValueColumn::Named {
            priority: priority.to_vec(),
        }
    }

    /// One column per KPI
    pub fn kpi(metric: usize) -> Self {
        ValueColumn::Block {
            first: 0,
            stride: 1,
            metric,
        }
    }

    /// Funnel steps come as (count, conversion) pairs
    pub fn funnel_step(step: usize) -> Self {
        ValueColumn::Block {
            first: 0,
            stride: 2,
            metric: step,
        }
    }
}

impl Default for ValueColumn {
    fn default() -> Self {
        ValueColumn::named(&EngineConfig::default().value_columns)
    }
}

/// Where one breakdown dimension is read from
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionColumn {
    pub key: String,
    pub spec: BreakdownSpec,
    /// Column index, `None` when even the positional fallback is out of range
    pub column: Option<usize>,
    /// False when the property was not found by name; the raw value is used
    pub formatted: bool,
}

/// Resolved column positions of a result
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnLayout {
    pub dimensions: Vec<DimensionColumn>,
    pub value_index: usize,
    pub value_header: String,
}

impl ColumnLayout {
    /// Locate the breakdown and value columns of `headers`.
    ///
    /// Breakdown columns start after the last reserved header. Each header in
    /// that range is claimed by the first unclaimed breakdown with the same
    /// property, so a property used twice maps to two dimensions.
    pub fn resolve(
        headers: &[String],
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
        reserved: &[String],
    ) -> Result<Self, Issue> {
        let start = headers
            .iter()
            .rposition(|h| reserved.contains(h))
            .map(|i| i + 1)
            .unwrap_or(0);

        let (value_index, breakdown_end) = match value_column {
            ValueColumn::Named { priority } => {
                let index = priority
                    .iter()
                    .find_map(|name| headers.iter().position(|h| h == name))
                    .ok_or_else(|| {
                        Issue::MalformedInput(format!(
                            "no value column among {:?}",
                            priority
                        ))
                    })?;
                if index < start {
                    return Err(Issue::MalformedInput(format!(
                        "value column '{}' precedes the breakdown columns",
                        headers[index]
                    )));
                }
                (index, index)
            }
            ValueColumn::Block {
                first,
                stride,
                metric,
            } => {
                let end = start + specs.len();
                (end + first + stride * metric, end)
            }
        };

        if value_index >= headers.len() {
            return Err(Issue::MalformedInput(format!(
                "value column {} out of range for {} headers",
                value_index,
                headers.len()
            )));
        }

        let mut claimed: Vec<Option<usize>> = vec![None; specs.len()];
        for column in start..breakdown_end {
            let header = &headers[column];
            if let Some(position) =
                (0..specs.len()).find(|&i| claimed[i].is_none() && specs[i].property == *header)
            {
                claimed[position] = Some(column);
            }
        }

        let dimensions = specs
            .iter()
            .enumerate()
            .map(|(position, spec)| {
                let key = dimension_key(&spec.property, position);
                match claimed[position] {
                    Some(column) => DimensionColumn {
                        key,
                        spec: spec.clone(),
                        column: Some(column),
                        formatted: true,
                    },
                    None => {
                        let issue = Issue::UnresolvableBreakdownColumn {
                            property: spec.property.clone(),
                        };
                        tracing::debug!(%issue, "Using positional column with raw values");
                        let fallback = start + position;
                        DimensionColumn {
                            key,
                            spec: spec.clone(),
                            column: (fallback < breakdown_end).then_some(fallback),
                            formatted: false,
                        }
                    }
                }
            })
            .collect();

        Ok(Self {
            dimensions,
            value_index,
            value_header: headers[value_index].clone(),
        })
    }
}

/// Turns query results into aggregate records
#[derive(Debug, Clone, Copy)]
pub struct RecordBuilder<'a> {
    formatter: &'a GranularityFormatter,
    config: &'a EngineConfig,
}

impl<'a> RecordBuilder<'a> {
    pub fn new(formatter: &'a GranularityFormatter, config: &'a EngineConfig) -> Self {
        Self { formatter, config }
    }

    pub fn layout(
        &self,
        result: &QueryResult,
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
    ) -> Result<ColumnLayout, Issue> {
        if result.headers.is_empty() {
            return Err(Issue::MalformedInput("no headers".to_string()));
        }
        if result.rows.is_empty() {
            return Err(Issue::MalformedInput("no rows".to_string()));
        }
        if let Some(position) = result
            .rows
            .iter()
            .position(|row| row.len() < result.headers.len())
        {
            return Err(Issue::MalformedInput(format!(
                "row {} is shorter than the headers",
                position
            )));
        }
        ColumnLayout::resolve(
            &result.headers,
            specs,
            value_column,
            &self.config.reserved_columns,
        )
    }

    /// One record per row, in row order.
    ///
    /// Degenerate input yields an empty sequence.
    pub fn build(
        &self,
        result: &QueryResult,
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
    ) -> Vec<AggregateRecord> {
        let layout = match self.layout(result, specs, value_column) {
            Ok(layout) => layout,
            Err(issue) => {
                tracing::debug!(%issue, "No records built");
                return Vec::new();
            }
        };

        result
            .rows
            .iter()
            .enumerate()
            .map(|(index, row)| {
                let (label, breakdown_values) = self.row_label(row, &layout);
                AggregateRecord {
                    index,
                    label,
                    value: cell_value(&row[layout.value_index]),
                    breakdown_values,
                    compare_value: None,
                }
            })
            .collect()
    }

    /// Label and per-dimension values of a row.
    ///
    /// Without breakdowns the label is the value column's header.
    pub fn row_label(&self, row: &[Cell], layout: &ColumnLayout) -> (String, Vec<BreakdownValue>) {
        if layout.dimensions.is_empty() {
            return (layout.value_header.clone(), Vec::new());
        }

        let breakdown_values: Vec<BreakdownValue> = layout
            .dimensions
            .iter()
            .map(|dimension| {
                let raw = dimension
                    .column
                    .and_then(|c| row.get(c))
                    .cloned()
                    .unwrap_or(Cell::Null);
                let label = if dimension.formatted {
                    self.formatter.format_breakdown(&raw, &dimension.spec)
                } else {
                    raw.to_raw_string()
                };
                BreakdownValue {
                    key: dimension.key.clone(),
                    label,
                    raw,
                }
            })
            .collect();

        let label = breakdown_values
            .iter()
            .map(|b| b.label.as_str())
            .collect::<Vec<_>>()
            .join(&self.config.label_separator);

        (label, breakdown_values)
    }
}

/// Numeric value of a value cell; anything non-numeric counts as 0
pub fn cell_value(cell: &Cell) -> f64 {
    cell.as_f64().unwrap_or(0.0)
}

/// Attach prior-period values to `records`, matched by label.
/// Labels missing from the comparison get 0.
pub fn attach_comparison(records: &mut [AggregateRecord], comparison: &[AggregateRecord]) {
    let by_label: HashMap<&str, f64> = comparison
        .iter()
        .map(|r| (r.label.as_str(), r.value))
        .collect();

    for record in records.iter_mut() {
        record.compare_value = Some(by_label.get(record.label.as_str()).copied().unwrap_or(0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicer_types::Granularity;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_named_priority_prefers_aggregate() {
        let layout = ColumnLayout::resolve(
            &headers(&["country", "count", "aggregate"]),
            &[BreakdownSpec::categorical("country")],
            &ValueColumn::default(),
            &[],
        )
        .unwrap();
        assert_eq!(layout.value_index, 2);
        assert_eq!(layout.value_header, "aggregate");
    }

    #[test]
    fn test_breakdown_columns_start_after_reserved_headers() {
        let layout = ColumnLayout::resolve(
            &headers(&["event_name", "country", "count"]),
            &[BreakdownSpec::categorical("country")],
            &ValueColumn::default(),
            &headers(&["event_name", "datetime"]),
        )
        .unwrap();
        assert_eq!(layout.dimensions[0].column, Some(1));
        assert!(layout.dimensions[0].formatted);
    }

    #[test]
    fn test_duplicate_properties_are_distinct_dimensions() {
        let specs = vec![
            BreakdownSpec::categorical("$browser"),
            BreakdownSpec::datetime("$timestamp", Granularity::Day),
            BreakdownSpec::categorical("$browser"),
        ];
        let layout = ColumnLayout::resolve(
            &headers(&["$browser", "$timestamp", "$browser", "count"]),
            &specs,
            &ValueColumn::default(),
            &[],
        )
        .unwrap();
        let columns: Vec<_> = layout.dimensions.iter().map(|d| d.column).collect();
        assert_eq!(columns, vec![Some(0), Some(1), Some(2)]);
        assert_eq!(layout.dimensions[2].key, "$browser - 2");
    }

    #[test]
    fn test_block_resolver_skips_breakdown_columns() {
        let specs = vec![BreakdownSpec::categorical("channel")];
        let hdrs = headers(&["channel", "sessions", "sessions_conv", "signups", "signups_conv"]);

        let kpi = ColumnLayout::resolve(&hdrs, &specs, &ValueColumn::kpi(2), &[]).unwrap();
        assert_eq!(kpi.value_index, 3);

        let funnel = ColumnLayout::resolve(&hdrs, &specs, &ValueColumn::funnel_step(1), &[]).unwrap();
        assert_eq!(funnel.value_index, 3);

        assert!(ColumnLayout::resolve(&hdrs, &specs, &ValueColumn::funnel_step(2), &[]).is_err());
    }

    #[test]
    fn test_missing_property_falls_back_to_position() {
        let layout = ColumnLayout::resolve(
            &headers(&["region", "count"]),
            &[BreakdownSpec::numerical("country")],
            &ValueColumn::default(),
            &[],
        )
        .unwrap();
        assert_eq!(layout.dimensions[0].column, Some(0));
        assert!(!layout.dimensions[0].formatted);
    }

    #[test]
    fn test_positional_fallback_keeps_raw_label() {
        let config = EngineConfig::default();
        let formatter = GranularityFormatter::new(&config);
        let result = QueryResult::new(
            headers(&["region", "count"]),
            vec![vec![Cell::Number(1234567.0), Cell::Number(5.0)]],
        );

        let records = RecordBuilder::new(&formatter, &config).build(
            &result,
            &[BreakdownSpec::numerical("country")],
            &ValueColumn::default(),
        );

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "1234567");
        assert_eq!(records[0].breakdown_values[0].label, "1234567");
        assert_eq!(records[0].breakdown_values[0].raw, Cell::Number(1234567.0));
        assert_eq!(records[0].value, 5.0);
    }

    #[test]
    fn test_attach_comparison_by_label() {
        let mut records = vec![AggregateRecord::new(0, "IN", 10.0), AggregateRecord::new(1, "US", 20.0)];
        let comparison = vec![AggregateRecord::new(0, "US", 15.0)];
        attach_comparison(&mut records, &comparison);
        assert_eq!(records[0].compare_value, Some(0.0));
        assert_eq!(records[1].compare_value, Some(15.0));
    }
}

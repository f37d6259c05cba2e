use slicer_types::{
    AggregateRecord, BreakdownSpec, BucketValue, Cell, Granularity, Issue, Period, QueryResult,
    SeriesRecord, SeriesSet,
};
use std::collections::HashMap;

use crate::config::EngineConfig;
use crate::format::GranularityFormatter;
use crate::records::{cell_value, RecordBuilder, ValueColumn};

/// Current and prior-period series, each on its own category axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparedSeries {
    pub current: SeriesSet,
    pub comparison: Option<SeriesSet>,
}

/// Builds zero-filled time-bucketed series from a time-indexed result
#[derive(Debug, Clone, Copy)]
pub struct SeriesBuilder<'a> {
    formatter: &'a GranularityFormatter,
    config: &'a EngineConfig,
}

impl<'a> SeriesBuilder<'a> {
    pub fn new(formatter: &'a GranularityFormatter, config: &'a EngineConfig) -> Self {
        Self { formatter, config }
    }

    /// Build one series per seed label.
    ///
    /// The category axis is the distinct date cells in first-seen order.
    /// Every series holds a value for every category; rows whose label
    /// matches no seed are ignored.
    pub fn build(
        &self,
        result: &QueryResult,
        seeds: &[AggregateRecord],
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
        frequency: Granularity,
        period: Period,
    ) -> SeriesSet {
        match self.try_build(result, seeds, specs, value_column, frequency, period) {
            Ok(set) => set,
            Err(issue) => {
                tracing::debug!(%issue, ?period, "No series built");
                SeriesSet::empty(period)
            }
        }
    }

    /// Build the current series and, when a prior-period result is given,
    /// the comparison series from the same seeds.
    pub fn build_compared(
        &self,
        current: &QueryResult,
        comparison: Option<&QueryResult>,
        seeds: &[AggregateRecord],
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
        frequency: Granularity,
    ) -> ComparedSeries {
        ComparedSeries {
            current: self.build(current, seeds, specs, value_column, frequency, Period::Current),
            comparison: comparison.map(|result| {
                self.build(result, seeds, specs, value_column, frequency, Period::Comparison)
            }),
        }
    }

    fn try_build(
        &self,
        result: &QueryResult,
        seeds: &[AggregateRecord],
        specs: &[BreakdownSpec],
        value_column: &ValueColumn,
        frequency: Granularity,
        period: Period,
    ) -> Result<SeriesSet, Issue> {
        let records = RecordBuilder::new(self.formatter, self.config);
        let layout = records.layout(result, specs, value_column)?;
        let date_index = result.header_index(&self.config.date_column).ok_or_else(|| {
            Issue::MalformedInput(format!("no '{}' column", self.config.date_column))
        })?;

        let mut categories: Vec<Cell> = Vec::new();
        let mut category_slots: HashMap<String, usize> = HashMap::new();
        for row in &result.rows {
            let cell = &row[date_index];
            let key = cell.to_raw_string();
            if !category_slots.contains_key(&key) {
                category_slots.insert(key, categories.len());
                categories.push(cell.clone());
            }
        }
        let category_labels: Vec<String> = categories
            .iter()
            .map(|c| self.formatter.format_date(c, frequency))
            .collect();

        let mut series: Vec<SeriesRecord> = Vec::new();
        let mut series_slots: HashMap<String, usize> = HashMap::new();
        for seed in seeds {
            if series_slots.contains_key(&seed.label) {
                continue;
            }
            series_slots.insert(seed.label.clone(), series.len());
            series.push(SeriesRecord {
                record: AggregateRecord {
                    index: series.len(),
                    ..seed.clone()
                },
                period,
                data: vec![0.0; categories.len()],
                buckets: category_labels
                    .iter()
                    .map(|label| BucketValue {
                        label: label.clone(),
                        value: 0.0,
                    })
                    .collect(),
                total: 0.0,
            });
        }

        let mut unmatched = 0usize;
        for row in &result.rows {
            let (label, _) = records.row_label(row, &layout);
            let Some(&slot) = series_slots.get(&label) else {
                unmatched += 1;
                continue;
            };
            let category = category_slots[&row[date_index].to_raw_string()];
            let value = cell_value(&row[layout.value_index]);
            series[slot].data[category] = value;
            series[slot].buckets[category].value = value;
        }
        if unmatched > 0 {
            tracing::debug!(unmatched, ?period, "Rows without a matching series were ignored");
        }

        for s in series.iter_mut() {
            s.total = s.data.iter().sum();
        }

        if series.len() > self.config.sparse_series_threshold {
            let before = series.len();
            series.retain(|s| s.data.iter().any(|v| *v != 0.0));
            tracing::debug!(before, after = series.len(), "Dropped empty series");
        }

        let date_wise_totals = (0..categories.len())
            .map(|c| series.iter().map(|s| s.data[c]).sum())
            .collect();

        Ok(SeriesSet {
            period,
            categories,
            category_labels,
            series,
            date_wise_totals,
        })
    }
}

use serde::{Deserialize, Serialize};
use slicer_types::{
    AggregateRecord, BreakdownSpec, ExportContext, ExportTable, Granularity, HierarchicalRow,
    QueryResult,
};

use crate::export::{aggregate_table_rows, date_table_rows, flatten};
use crate::records::{attach_comparison, ValueColumn};
use crate::series::ComparedSeries;
use crate::sort::filter_by_label;
use crate::window::{ViewState, VisibleSeries};
use crate::Engine;

/// Everything one render pass reads
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderInput {
    pub result: QueryResult,
    /// Breakdowns the result was queried with; taken from `result.meta` when empty
    #[serde(default)]
    pub breakdowns: Vec<BreakdownSpec>,
    /// Prior-period aggregate result
    #[serde(default)]
    pub comparison: Option<QueryResult>,
    /// Time-indexed result for the series view
    #[serde(default)]
    pub series: Option<QueryResult>,
    /// Prior-period time-indexed result
    #[serde(default)]
    pub comparison_series: Option<QueryResult>,
    #[serde(default)]
    pub value_column: ValueColumn,
    #[serde(default = "default_frequency")]
    pub frequency: Granularity,
    /// View state from the previous pass
    #[serde(default)]
    pub view: Option<ViewState>,
    #[serde(default)]
    pub widget: bool,
    #[serde(default)]
    pub search: Option<String>,
}

fn default_frequency() -> Granularity {
    Granularity::Day
}

impl RenderInput {
    pub fn new(result: QueryResult) -> Self {
        Self {
            result,
            breakdowns: Vec::new(),
            comparison: None,
            series: None,
            comparison_series: None,
            value_column: ValueColumn::default(),
            frequency: default_frequency(),
            view: None,
            widget: false,
            search: None,
        }
    }

    pub fn with_breakdowns(mut self, breakdowns: Vec<BreakdownSpec>) -> Self {
        self.breakdowns = breakdowns;
        self
    }

    pub fn with_comparison(mut self, comparison: QueryResult) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn with_series(mut self, series: QueryResult, frequency: Granularity) -> Self {
        self.series = Some(series);
        self.frequency = frequency;
        self
    }

    pub fn with_comparison_series(mut self, series: QueryResult) -> Self {
        self.comparison_series = Some(series);
        self
    }

    pub fn with_value_column(mut self, value_column: ValueColumn) -> Self {
        self.value_column = value_column;
        self
    }

    pub fn with_view(mut self, view: ViewState) -> Self {
        self.view = Some(view);
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn widget(mut self) -> Self {
        self.widget = true;
        self
    }

    /// Breakdowns in effect: the explicit list, else the ones echoed in the result
    pub fn specs(&self) -> &[BreakdownSpec] {
        if self.breakdowns.is_empty() {
            &self.result.meta.query.breakdowns
        } else {
            &self.breakdowns
        }
    }

    fn comparison_applied(&self) -> bool {
        self.comparison.is_some() || self.comparison_series.is_some()
    }
}

/// Presentation shapes produced by one render pass
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOutput {
    /// All records under the current sort, narrowed by the search text
    pub records: Vec<AggregateRecord>,
    /// Records in the visible window
    pub visible: Vec<AggregateRecord>,
    /// Nested table rows; empty outside 1 to 3 breakdowns
    pub nested: Vec<HierarchicalRow>,
    pub series: Option<ComparedSeries>,
    pub visible_series: VisibleSeries,
    /// State to hand back on the next pass
    pub view: ViewState,
    pub breakdowns: Vec<BreakdownSpec>,
    /// A comparison period was applied to records or series
    pub comparison: bool,
    /// Records carry prior-period values from an aggregate comparison
    pub compared_records: bool,
}

impl RenderOutput {
    /// Flat export of the date table when series were built, otherwise of
    /// the aggregate table
    pub fn export_table(&self, metric: &str, ctx: &ExportContext) -> ExportTable {
        let rows = match &self.series {
            Some(series) => date_table_rows(
                &series.current,
                series.comparison.as_ref(),
                &self.breakdowns,
                metric,
            ),
            None => aggregate_table_rows(
                &self.records,
                &self.breakdowns,
                metric,
                self.compared_records,
            ),
        };
        flatten(&rows, ctx)
    }
}

impl Engine {
    /// Run the full pipeline for one render pass.
    ///
    /// Degenerate input produces empty shapes, never an error.
    pub fn render(&self, input: &RenderInput) -> RenderOutput {
        let specs = input.specs();
        let comparison = input.comparison_applied();
        let builder = self.records();
        let sorter = self.sorter();
        let selector = self.window();

        let mut records = builder.build(&input.result, specs, &input.value_column);
        if let Some(prior) = &input.comparison {
            let prior_records = builder.build(prior, specs, &input.value_column);
            attach_comparison(&mut records, &prior_records);
        }

        let view = match &input.view {
            Some(previous) => previous.refresh(&records, specs, comparison, &sorter, &selector),
            None => ViewState::initial(&records, specs, comparison, &sorter, &selector),
        };

        let sorted = sorter.sort(&records, &view.sorter);
        let visible: Vec<AggregateRecord> = selector
            .resolve(&view.visible, &sorted)
            .into_iter()
            .cloned()
            .collect();

        let nested = if (1..=3).contains(&specs.len()) {
            self.grouper().group(&records, specs, input.widget)
        } else {
            Vec::new()
        };

        let series = input.series.as_ref().map(|result| {
            self.series().build_compared(
                result,
                input.comparison_series.as_ref(),
                &sorted,
                specs,
                &input.value_column,
                input.frequency,
            )
        });
        let visible_series = series
            .as_ref()
            .map(|s| selector.visible_series(&view.visible, &s.current, s.comparison.as_ref()))
            .unwrap_or_default();

        let records = match input.search.as_deref() {
            Some(search) if !search.is_empty() => filter_by_label(&sorted, search),
            _ => sorted,
        };

        tracing::debug!(
            records = records.len(),
            visible = visible.len(),
            nested = nested.len(),
            "Render pass complete"
        );

        RenderOutput {
            records,
            visible,
            nested,
            series,
            visible_series,
            view,
            breakdowns: specs.to_vec(),
            comparison,
            compared_records: input.comparison.is_some(),
        }
    }
}

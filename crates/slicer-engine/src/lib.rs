// Engine module - turns query results into tables, series and exports
// This layer sits between the data model (types) and presentation consumers

pub mod config;
pub mod export;
pub mod format;
pub mod grouping;
pub mod records;
mod render;
pub mod series;
pub mod sort;
pub mod window;

pub use config::{DateFormats, EngineConfig};
pub use export::{
    aggregate_table_rows, breakdown_titles, date_table_rows, flatten, percent_change,
    to_csv_string, write_csv, write_csv_file, OVERALL_COLUMN,
};
pub use format::{group_thousands, GranularityFormatter};
pub use grouping::HierarchicalGrouper;
pub use records::{attach_comparison, cell_value, ColumnLayout, RecordBuilder, ValueColumn};
pub use render::{RenderInput, RenderOutput};
pub use series::{ComparedSeries, SeriesBuilder};
pub use sort::{default_sorter, filter_by_label, next_sorter_state, FieldRef, Sortable, Sorter};
pub use window::{ViewState, VisibleSeries, WindowSelector};

use std::path::Path;

// Façade API - Stable public interface for presentation consumers
// Components borrow the engine's config and formatter

/// Configured engine; cheap to share, holds no per-render state
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    formatter: GranularityFormatter,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let formatter = GranularityFormatter::new(&config);
        Self { config, formatter }
    }

    /// Engine configured from a TOML file; defaults when the file is missing
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        Ok(Self::new(EngineConfig::load_from(path)?))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn formatter(&self) -> &GranularityFormatter {
        &self.formatter
    }

    pub fn records(&self) -> RecordBuilder<'_> {
        RecordBuilder::new(&self.formatter, &self.config)
    }

    pub fn sorter(&self) -> Sorter<'_> {
        Sorter::new(&self.formatter)
    }

    pub fn grouper(&self) -> HierarchicalGrouper {
        HierarchicalGrouper::new(self.config.widget_entry_limit)
    }

    pub fn series(&self) -> SeriesBuilder<'_> {
        SeriesBuilder::new(&self.formatter, &self.config)
    }

    pub fn window(&self) -> WindowSelector {
        WindowSelector::new(self.config.visible_cap)
    }
}

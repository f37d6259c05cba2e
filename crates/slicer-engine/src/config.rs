use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slicer_types::Granularity;
use std::collections::BTreeMap;
use std::path::Path;

/// Placeholder for the quarter number in date format patterns
pub const QUARTER_PLACEHOLDER: &str = "%Q";

/// strftime patterns per granularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFormats {
    pub hour: String,
    pub day: String,
    pub week: String,
    pub month: String,
    pub quarter: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            hour: "%-I %p, %b %-d".to_string(),
            day: "%b %-d".to_string(),
            week: "%b %-d".to_string(),
            month: "%b %Y".to_string(),
            quarter: "Q%Q, %Y".to_string(),
        }
    }
}

impl DateFormats {
    pub fn pattern(&self, granularity: Granularity) -> &str {
        match granularity {
            Granularity::Hour => &self.hour,
            Granularity::Day => &self.day,
            Granularity::Week => &self.week,
            Granularity::Month => &self.month,
            Granularity::Quarter => &self.quarter,
        }
    }
}

/// Engine configuration.
///
/// Everything here is presentation policy; the engine holds no other state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of records charted at once
    pub visible_cap: usize,
    /// IANA name of the reporting timezone
    pub timezone: String,
    /// Joins breakdown labels into a record label
    pub label_separator: String,
    /// Value column header names, highest priority first
    pub value_columns: Vec<String>,
    /// Header of the date column in time-indexed results
    pub date_column: String,
    /// Leading columns that are never breakdown columns
    pub reserved_columns: Vec<String>,
    /// Chart entries kept per cell in widget mode
    pub widget_entry_limit: usize,
    /// Above this many series, series without data points are dropped
    pub sparse_series_threshold: usize,
    // Tables last so the struct serializes to valid TOML
    pub date_formats: DateFormats,
    /// Raw values replaced by a display label before formatting
    pub display_values: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let mut display_values = BTreeMap::new();
        display_values.insert("$none".to_string(), "(Not Set)".to_string());

        Self {
            visible_cap: 10,
            timezone: "UTC".to_string(),
            label_separator: ", ".to_string(),
            value_columns: vec![
                "aggregate".to_string(),
                "count".to_string(),
                "all_users".to_string(),
            ],
            date_column: "datetime".to_string(),
            reserved_columns: vec!["event_name".to_string(), "datetime".to_string()],
            widget_entry_limit: 3,
            sparse_series_threshold: 1000,
            date_formats: DateFormats::default(),
            display_values,
        }
    }
}

impl EngineConfig {
    /// Load config from a TOML file. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.visible_cap == 0 {
            anyhow::bail!("visible_cap must be at least 1");
        }
        if self.value_columns.is_empty() {
            anyhow::bail!("value_columns must name at least one header");
        }
        self.timezone
            .parse::<Tz>()
            .map_err(|e| anyhow::anyhow!("Unknown timezone '{}': {}", self.timezone, e))?;

        for granularity in Granularity::all() {
            let pattern = self.date_formats.pattern(granularity);
            if !is_valid_pattern(pattern) {
                anyhow::bail!("Invalid {} date format: {}", granularity, pattern);
            }
        }
        Ok(())
    }

    /// Reporting timezone; UTC if the configured name does not parse
    pub fn tz(&self) -> Tz {
        self.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %self.timezone, "Unknown timezone, falling back to UTC");
            Tz::UTC
        })
    }
}

fn is_valid_pattern(pattern: &str) -> bool {
    let pattern = pattern.replace(QUARTER_PLACEHOLDER, "1");
    !StrftimeItems::new(&pattern).any(|item| matches!(item, Item::Error))
}

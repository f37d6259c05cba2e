//! Display labels for raw cells.
//!
//! Formatting is a pure function of (granularity, raw value): the same cell
//! always produces the same label, and a label fed back in comes out
//! unchanged. Values that cannot be interpreted pass through as their raw
//! string form.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use slicer_types::{BreakdownSpec, Cell, Granularity, PropType};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::config::{DateFormats, EngineConfig, QUARTER_PLACEHOLDER};

static NUMERIC_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("valid numeric literal regex"));

/// Key looked up in the display table for null cells
const NONE_VALUE: &str = "$none";

/// Epoch values above this are milliseconds
const EPOCH_MILLIS_THRESHOLD: f64 = 1e11;

#[derive(Debug, Clone)]
pub struct GranularityFormatter {
    tz: Tz,
    formats: DateFormats,
    display_values: BTreeMap<String, String>,
}

impl GranularityFormatter {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tz: config.tz(),
            formats: config.date_formats.clone(),
            display_values: config.display_values.clone(),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Label of a breakdown cell, formatted by property type and granularity
    pub fn format_breakdown(&self, raw: &Cell, spec: &BreakdownSpec) -> String {
        self.format(raw, spec.effective_granularity(), spec.prop_type)
    }

    pub fn format(
        &self,
        raw: &Cell,
        granularity: Option<Granularity>,
        prop_type: PropType,
    ) -> String {
        let raw_string = if raw.is_null() {
            NONE_VALUE.to_string()
        } else {
            raw.to_raw_string()
        };

        if let Some(display) = self.display_values.get(&raw_string) {
            return display.clone();
        }

        match granularity {
            Some(granularity) => self.format_date(raw, granularity),
            None if prop_type == PropType::Numerical => group_thousands(&raw_string),
            None => raw_string,
        }
    }

    /// Date label of `raw` at `granularity`; unparsable values pass through
    pub fn format_date(&self, raw: &Cell, granularity: Granularity) -> String {
        let Some(instant) = self.parse_instant(raw) else {
            tracing::trace!(raw = ?raw, "Not a datetime, passing through");
            return raw.to_raw_string();
        };

        let quarter = (instant.month0() / 3 + 1).to_string();
        let pattern = self
            .formats
            .pattern(granularity)
            .replace(QUARTER_PLACEHOLDER, &quarter);

        let mut label = String::new();
        if write!(label, "{}", instant.format(&pattern)).is_err() {
            tracing::warn!(pattern = %pattern, "Date format failed, passing through");
            return raw.to_raw_string();
        }
        label
    }

    /// Chronological instant of a raw cell in the reporting timezone.
    ///
    /// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DDTHH:MM:SS`,
    /// `YYYY-MM-DD` (naive values are local to the reporting timezone) and
    /// unix epoch seconds or milliseconds.
    pub fn parse_instant(&self, raw: &Cell) -> Option<DateTime<Tz>> {
        match raw {
            Cell::Number(n) => self.instant_from_epoch(*n),
            Cell::Text(s) => self.parse_text_instant(s.trim()),
            Cell::Null => None,
        }
    }

    fn parse_text_instant(&self, s: &str) -> Option<DateTime<Tz>> {
        if s.is_empty() {
            return None;
        }
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&self.tz));
        }
        for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                return self.local_instant(naive);
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            let naive = date.and_hms_opt(0, 0, 0)?;
            return self.local_instant(naive);
        }
        if NUMERIC_LITERAL.is_match(s) {
            return s.parse::<f64>().ok().and_then(|n| self.instant_from_epoch(n));
        }
        None
    }

    /// Naive wall-clock time in the reporting timezone. A time skipped by a
    /// DST transition maps to the same wall-clock time one hour later.
    fn local_instant(&self, naive: NaiveDateTime) -> Option<DateTime<Tz>> {
        self.tz.from_local_datetime(&naive).earliest().or_else(|| {
            tracing::trace!(%naive, "Local time falls in a DST gap");
            self.tz
                .from_local_datetime(&(naive + Duration::hours(1)))
                .earliest()
        })
    }

    fn instant_from_epoch(&self, n: f64) -> Option<DateTime<Tz>> {
        if !n.is_finite() {
            return None;
        }
        let millis = if n.abs() > EPOCH_MILLIS_THRESHOLD {
            n as i64
        } else {
            (n * 1000.0) as i64
        };
        Utc.timestamp_millis_opt(millis)
            .single()
            .map(|dt| dt.with_timezone(&self.tz))
    }
}

/// Insert thousands separators into the integer part of a numeric literal.
/// Anything that is not a plain numeric literal is returned unchanged.
pub fn group_thousands(literal: &str) -> String {
    let trimmed = literal.trim();
    if !NUMERIC_LITERAL.is_match(trimmed) {
        return literal.to_string();
    }

    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", trimmed),
    };
    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((int_part, frac)) => (int_part, Some(frac)),
        None => (unsigned, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    match frac_part {
        Some(frac) => format!("{}{}.{}", sign, grouped, frac),
        None => format!("{}{}", sign, grouped),
    }
}

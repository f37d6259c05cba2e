//! Query results shaped like the backend's responses.

use serde_json::{json, Value};
use slicer_types::{BreakdownSpec, Granularity, QueryResult};

/// Parse a result from its JSON wire form. Panics on invalid fixtures.
pub fn query(value: Value) -> QueryResult {
    serde_json::from_value(value).expect("fixture is a valid query result")
}

/// `country` breakdown of an event count
pub fn country_counts() -> QueryResult {
    query(json!({
        "headers": ["country", "count"],
        "rows": [["IN", 10], ["US", 20]],
        "meta": {"query": {"gbp": [{"pr": "country", "en": "event", "pty": "categorical"}]}}
    }))
}

/// Prior period of [`country_counts`]; `IN` has no data
pub fn country_counts_prior() -> QueryResult {
    query(json!({
        "headers": ["country", "count"],
        "rows": [["US", 16], ["FR", 4]]
    }))
}

/// Eight countries with distinct counts, listed smallest first
pub fn eight_countries() -> QueryResult {
    let countries = ["NO", "SE", "FI", "DK", "DE", "FR", "IN", "US"];
    let rows: Vec<Value> = countries
        .iter()
        .enumerate()
        .map(|(i, country)| json!([country, (i + 1) * 10]))
        .collect();
    query(json!({"headers": ["country", "count"], "rows": rows}))
}

pub fn three_level_specs() -> Vec<BreakdownSpec> {
    vec![
        BreakdownSpec::categorical("country"),
        BreakdownSpec::categorical("city"),
        BreakdownSpec::categorical("$browser"),
    ]
}

/// Three breakdowns: `A` has two cities, `B` and `C` one each
pub fn three_level_result() -> QueryResult {
    query(json!({
        "headers": ["event_name", "country", "city", "$browser", "aggregate"],
        "rows": [
            ["signup", "A", "x", "chrome", 50],
            ["signup", "B", "z", "chrome", 30],
            ["signup", "A", "y", "chrome", 40],
            ["signup", "C", "w", "firefox", 20],
            ["signup", "A", "x", "safari", 35]
        ]
    }))
}

pub fn daily_specs() -> Vec<BreakdownSpec> {
    vec![BreakdownSpec::categorical("country")]
}

/// Time-indexed counts over three days; `US` has no row on the last day
pub fn daily_series() -> QueryResult {
    query(json!({
        "headers": ["datetime", "country", "count"],
        "rows": [
            ["2024-03-01T00:00:00Z", "US", 8],
            ["2024-03-01T00:00:00Z", "IN", 3],
            ["2024-03-02T00:00:00Z", "US", 12],
            ["2024-03-02T00:00:00Z", "IN", 7],
            ["2024-03-03T00:00:00Z", "IN", 2]
        ]
    }))
}

/// Prior period of [`daily_series`], one week earlier
pub fn daily_series_prior() -> QueryResult {
    query(json!({
        "headers": ["datetime", "country", "count"],
        "rows": [
            ["2024-02-23T00:00:00Z", "US", 5],
            ["2024-02-24T00:00:00Z", "US", 5],
            ["2024-02-25T00:00:00Z", "IN", 4]
        ]
    }))
}

/// Monthly breakdown by a datetime property
pub fn monthly_signups() -> (QueryResult, Vec<BreakdownSpec>) {
    let result = query(json!({
        "headers": ["$timestamp", "count"],
        "rows": [
            ["2024-01-10T00:00:00Z", 5],
            ["2024-03-15T00:00:00Z", 9],
            ["2023-12-01T00:00:00Z", 7]
        ]
    }));
    (
        result,
        vec![BreakdownSpec::datetime("$timestamp", Granularity::Month)],
    )
}

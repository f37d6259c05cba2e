//! Structural assertions for engine output.

use anyhow::Result;
use slicer_types::{HierarchicalRow, SeriesSet};

/// Row spans of the first cell of each row
pub fn row_spans(rows: &[HierarchicalRow]) -> Vec<Option<usize>> {
    rows.iter().map(HierarchicalRow::first_row_span).collect()
}

/// Assert that every group's span covers exactly the rows it heads.
pub fn assert_row_spans_consistent(rows: &[HierarchicalRow]) -> Result<()> {
    let mut i = 0;
    while i < rows.len() {
        let span = match rows[i].first_row_span() {
            Some(span) if span > 0 => span,
            other => anyhow::bail!("Row {} should open a group, has span {:?}", i, other),
        };
        if i + span > rows.len() {
            anyhow::bail!("Row {} spans {} rows past the end of the table", i, span);
        }
        for j in i + 1..i + span {
            if rows[j].first_row_span() != Some(0) {
                anyhow::bail!("Row {} inside a group should have span 0", j);
            }
        }
        i += span;
    }
    Ok(())
}

/// Assert that every series has a value for every category.
pub fn assert_zero_filled(set: &SeriesSet) -> Result<()> {
    for series in &set.series {
        if series.data.len() != set.categories.len() {
            anyhow::bail!(
                "Series '{}' has {} points for {} categories",
                series.label(),
                series.data.len(),
                set.categories.len()
            );
        }
        let labels: Vec<&str> = series.buckets.iter().map(|b| b.label.as_str()).collect();
        if labels != set.category_labels {
            anyhow::bail!(
                "Series '{}' buckets {:?} do not match the axis {:?}",
                series.label(),
                labels,
                set.category_labels
            );
        }
    }
    Ok(())
}

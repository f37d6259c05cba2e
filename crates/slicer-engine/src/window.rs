//! Bounded selection of the records shown at once, and the caller-owned
//! view state that survives rebuilds.

use serde::{Deserialize, Serialize};
use slicer_types::{BreakdownSpec, Issue, SeriesRecord, SeriesSet, SorterState, VisibleSet};
use std::collections::HashSet;

use crate::sort::{default_sorter, Sortable, Sorter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSelector {
    cap: usize,
}

impl WindowSelector {
    /// A cap of 0 is raised to 1
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Top labels of already sorted records
    pub fn default_visible<R: Sortable>(&self, sorted: &[R]) -> VisibleSet {
        let mut seen = HashSet::new();
        VisibleSet::new(
            sorted
                .iter()
                .map(|r| r.label())
                .filter(|label| seen.insert(*label))
                .take(self.cap)
                .map(str::to_string)
                .collect(),
        )
    }

    /// Validate an explicit selection against `records`.
    ///
    /// Duplicates and labels not present in `records` are removed first; the
    /// remainder must hold between 1 and `cap` labels.
    pub fn try_reselect<R: Sortable>(
        &self,
        records: &[R],
        selection: &[String],
    ) -> Result<VisibleSet, Issue> {
        let known: HashSet<&str> = records.iter().map(|r| r.label()).collect();
        let mut seen = HashSet::new();
        let mut labels = Vec::new();

        for label in selection {
            if !seen.insert(label.as_str()) {
                continue;
            }
            if known.contains(label.as_str()) {
                labels.push(label.clone());
            } else {
                tracing::debug!(label = %label, "Selected label is not in the records");
            }
        }

        if labels.is_empty() || labels.len() > self.cap {
            return Err(Issue::SelectionBoundsViolation {
                requested: labels.len(),
                cap: self.cap,
            });
        }
        Ok(VisibleSet::new(labels))
    }

    /// Apply a selection, keeping `current` when it is out of bounds
    pub fn reselect<R: Sortable>(
        &self,
        current: &VisibleSet,
        records: &[R],
        selection: &[String],
    ) -> VisibleSet {
        self.try_reselect(records, selection).unwrap_or_else(|issue| {
            tracing::debug!(%issue, "Selection rejected, keeping previous set");
            current.clone()
        })
    }

    /// Records named by `visible`, in record order, at most `cap` of them
    pub fn resolve<'r, R: Sortable>(&self, visible: &VisibleSet, records: &'r [R]) -> Vec<&'r R> {
        records
            .iter()
            .filter(|r| visible.contains(r.label()))
            .take(self.cap)
            .collect()
    }

    /// Visible current series, each paired with the comparison series of
    /// the same label when one exists
    pub fn visible_series(
        &self,
        visible: &VisibleSet,
        current: &SeriesSet,
        comparison: Option<&SeriesSet>,
    ) -> VisibleSeries {
        let current: Vec<SeriesRecord> = self
            .resolve(visible, &current.series)
            .into_iter()
            .cloned()
            .collect();
        let comparison = comparison
            .map(|set| {
                current
                    .iter()
                    .filter_map(|s| set.find(s.label()).cloned())
                    .collect()
            })
            .unwrap_or_default();

        VisibleSeries {
            current,
            comparison,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibleSeries {
    pub current: Vec<SeriesRecord>,
    pub comparison: Vec<SeriesRecord>,
}

/// Sort and selection owned by the caller across rebuilds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub sorter: SorterState,
    pub visible: VisibleSet,
    /// Breakdown count the state was built for
    pub arity: usize,
    /// Whether a comparison period was applied
    pub comparison: bool,
}

impl ViewState {
    /// Default sort for `specs` and the top records under it
    pub fn initial<R: Sortable + Clone>(
        records: &[R],
        specs: &[BreakdownSpec],
        comparison: bool,
        sorter: &Sorter<'_>,
        selector: &WindowSelector,
    ) -> Self {
        let state = default_sorter(specs);
        let visible = selector.default_visible(&sorter.sort(records, &state));
        Self {
            sorter: state,
            visible,
            arity: specs.len(),
            comparison,
        }
    }

    /// Carry this state over to freshly built `records`.
    ///
    /// A change of breakdown arity or comparison mode resets everything.
    /// Otherwise the sort is kept and the selection is narrowed to labels
    /// that still exist; if none do, the top records under the kept sort
    /// become visible.
    pub fn refresh<R: Sortable + Clone>(
        &self,
        records: &[R],
        specs: &[BreakdownSpec],
        comparison: bool,
        sorter: &Sorter<'_>,
        selector: &WindowSelector,
    ) -> Self {
        if self.arity != specs.len() || self.comparison != comparison {
            tracing::debug!(
                arity = specs.len(),
                comparison,
                "Breakdown shape changed, resetting view state"
            );
            return Self::initial(records, specs, comparison, sorter, selector);
        }

        let survivors: Vec<String> = self
            .visible
            .labels()
            .iter()
            .filter(|label| records.iter().any(|r| r.label() == label.as_str()))
            .take(selector.cap())
            .cloned()
            .collect();

        let visible = if survivors.is_empty() {
            tracing::debug!("No visible label survived, selecting top records");
            selector.default_visible(&sorter.sort(records, &self.sorter))
        } else {
            VisibleSet::new(survivors)
        };

        Self {
            visible,
            ..self.clone()
        }
    }
}

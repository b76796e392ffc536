//! Per-bucket queries over a [`UrlMetricGroupCollection`].
//!
//! INP observations are keyed by a locator string and kept in first-seen
//! order. Nothing is deduplicated or sorted: two interactions on `#cta`
//! reported by two page loads are two entries under `#cta`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::metrics::{InpData, Rating, UrlMetric, UrlMetricGroup, UrlMetricGroupCollection};

/// One interaction's latency and rating, stripped of its locator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InpObservation {
    pub value: f64,
    pub rating: Rating,
}

impl From<&InpData> for InpObservation {
    fn from(entry: &InpData) -> Self {
        Self {
            value: entry.value,
            rating: entry.rating,
        }
    }
}

/// Locator to observations, in insertion order.
pub type InpObservations = IndexMap<String, Vec<InpObservation>>;

/// Which field of an [`InpData`] entry keys the observation map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocatorKind {
    /// The CSS selector web-vitals reports. Resolved in the browser.
    InteractionTarget,
    /// The element path the client computed. Entries without one are skipped.
    ElementPath,
}

impl LocatorKind {
    fn locator(self, entry: &InpData) -> Option<&str> {
        match self {
            LocatorKind::InteractionTarget => Some(entry.interaction_target.as_str()),
            LocatorKind::ElementPath => entry.xpath.as_ref().map(|xpath| xpath.as_str()),
        }
    }
}

fn accumulate<'a, I>(observations: &mut InpObservations, metrics: I, kind: LocatorKind)
where
    I: IntoIterator<Item = &'a UrlMetric>,
{
    for metric in metrics {
        for entry in metric.inp_entries() {
            let Some(locator) = kind.locator(entry) else {
                trace!(interaction_target = %entry.interaction_target, "INP entry has no element path, skipping");
                continue;
            };
            observations
                .entry(locator.to_string())
                .or_default()
                .push(InpObservation::from(entry));
        }
    }
}

impl UrlMetricGroup {
    /// Accumulates every INP entry of this group's metrics under its locator.
    pub fn inp_observations(&self, kind: LocatorKind) -> InpObservations {
        let mut observations = InpObservations::new();
        accumulate(&mut observations, self, kind);
        observations
    }
}

impl UrlMetricGroupCollection {
    /// Folds [`UrlMetricGroup::inp_observations`] across all groups in
    /// ascending viewport order.
    pub fn inp_observations(&self, kind: LocatorKind) -> InpObservations {
        let mut observations = InpObservations::new();
        for group in self {
            accumulate(&mut observations, group, kind);
        }
        observations
    }

    /// Whether any metric in any group carries at least one INP entry.
    pub fn has_inp_data(&self) -> bool {
        self.iter()
            .flat_map(|group| group.iter())
            .any(|metric| !metric.inp_entries().is_empty())
    }
}

/// Serializes observations for embedding in a page, as the JSON object
/// `{ locator: [{ value, rating }, ...] }`.
pub fn encode_observations(observations: &InpObservations) -> serde_json::Result<String> {
    serde_json::to_string(observations)
}

//! URL Metric data model
//!
//! A URL Metric is one page-load's report from one viewport. Reports are
//! bucketed into [`UrlMetricGroup`]s by viewport width; the groups of one
//! page form a [`UrlMetricGroupCollection`].
//!
//! The JSON shapes are the ones the Optimization Detective storage layer
//! produces, so field names are camelCase on the wire.
//!
//! Stored element paths are not validated by the storage schema. A stored
//! path that does not parse is logged and read as absent, so one bad entry
//! only loses its own locator.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::element_path::ElementPath;

/// web-vitals rating for a single INP interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rating {
    Good,
    NeedsImprovement,
    Poor,
}

impl Rating {
    pub const ALL: [Rating; 3] = [Rating::Good, Rating::NeedsImprovement, Rating::Poor];

    pub fn as_str(self) -> &'static str {
        match self {
            Rating::Good => "good",
            Rating::NeedsImprovement => "needs-improvement",
            Rating::Poor => "poor",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a rating string outside the web-vitals enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown INP rating {0:?}")]
pub struct UnknownRating(pub String);

impl FromStr for Rating {
    type Err = UnknownRating;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Rating::ALL
            .into_iter()
            .find(|rating| rating.as_str() == s)
            .ok_or_else(|| UnknownRating(s.to_string()))
    }
}

/// One INP interaction as reported by the client collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InpData {
    /// Interaction latency in milliseconds.
    pub value: f64,
    pub rating: Rating,
    /// CSS selector of the interaction target, as web-vitals attributes it.
    pub interaction_target: String,
    /// Element path of the target, absent when the client could not compute it.
    #[serde(
        default,
        deserialize_with = "lenient_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub xpath: Option<ElementPath>,
}

impl InpData {
    pub fn new(value: f64, rating: Rating, interaction_target: impl Into<String>) -> Self {
        Self {
            value,
            rating,
            interaction_target: interaction_target.into(),
            xpath: None,
        }
    }

    pub fn with_xpath(mut self, xpath: ElementPath) -> Self {
        self.xpath = Some(xpath);
        self
    }
}

/// One page-load report from one viewport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMetric {
    pub viewport_width: u32,
    #[serde(
        default,
        deserialize_with = "lenient_path",
        skip_serializing_if = "Option::is_none"
    )]
    pub lcp_element: Option<ElementPath>,
    /// Absent on reports from clients that did not run the INP collector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inp_data: Option<Vec<InpData>>,
}

impl UrlMetric {
    pub fn new(viewport_width: u32) -> Self {
        Self {
            viewport_width,
            lcp_element: None,
            inp_data: None,
        }
    }

    pub fn with_lcp_element(mut self, xpath: ElementPath) -> Self {
        self.lcp_element = Some(xpath);
        self
    }

    pub fn with_inp_data(mut self, inp_data: Vec<InpData>) -> Self {
        self.inp_data = Some(inp_data);
        self
    }

    /// INP entries in report order; empty when the report carries none.
    pub fn inp_entries(&self) -> &[InpData] {
        self.inp_data.as_deref().unwrap_or_default()
    }
}

/// The LCP element a group agreed on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LcpElement {
    pub xpath: ElementPath,
}

/// URL Metrics whose viewport width falls in one breakpoint bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlMetricGroup {
    pub minimum_viewport_width: u32,
    /// `None` for the widest, unbounded bucket.
    #[serde(default)]
    pub maximum_viewport_width: Option<u32>,
    #[serde(
        default,
        deserialize_with = "lenient_lcp_element",
        skip_serializing_if = "Option::is_none"
    )]
    pub lcp_element: Option<LcpElement>,
    #[serde(default)]
    pub url_metrics: Vec<UrlMetric>,
}

impl UrlMetricGroup {
    pub fn new(minimum_viewport_width: u32, maximum_viewport_width: Option<u32>) -> Self {
        Self {
            minimum_viewport_width,
            maximum_viewport_width,
            lcp_element: None,
            url_metrics: Vec::new(),
        }
    }

    pub fn with_lcp_element(mut self, xpath: ElementPath) -> Self {
        self.lcp_element = Some(LcpElement { xpath });
        self
    }

    pub fn with_url_metric(mut self, metric: UrlMetric) -> Self {
        self.url_metrics.push(metric);
        self
    }

    pub fn push(&mut self, metric: UrlMetric) {
        self.url_metrics.push(metric);
    }

    pub fn len(&self) -> usize {
        self.url_metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.url_metrics.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UrlMetric> {
        self.url_metrics.iter()
    }

    /// Element path of the group's common LCP element, if one was determined.
    pub fn lcp_path(&self) -> Option<&ElementPath> {
        self.lcp_element.as_ref().map(|lcp| &lcp.xpath)
    }

    /// Whether `viewport_width` falls inside this bucket.
    pub fn contains_viewport(&self, viewport_width: u32) -> bool {
        viewport_width >= self.minimum_viewport_width
            && self
                .maximum_viewport_width
                .is_none_or(|max| viewport_width <= max)
    }
}

impl<'a> IntoIterator for &'a UrlMetricGroup {
    type Item = &'a UrlMetric;
    type IntoIter = std::slice::Iter<'a, UrlMetric>;

    fn into_iter(self) -> Self::IntoIter {
        self.url_metrics.iter()
    }
}

fn parse_stored_path(raw: &str) -> Option<ElementPath> {
    match raw.parse() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Ignoring stored element path: {}", e);
            None
        }
    }
}

fn lenient_path<'de, D>(deserializer: D) -> Result<Option<ElementPath>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_stored_path))
}

fn lenient_lcp_element<'de, D>(deserializer: D) -> Result<Option<LcpElement>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct StoredLcpElement {
        #[serde(default)]
        xpath: Option<String>,
    }

    let stored = Option::<StoredLcpElement>::deserialize(deserializer)?;
    Ok(stored
        .and_then(|stored| stored.xpath)
        .as_deref()
        .and_then(parse_stored_path)
        .map(|xpath| LcpElement { xpath }))
}

/// All groups of one page, ordered by ascending minimum viewport width.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<UrlMetricGroup>", into = "Vec<UrlMetricGroup>")]
pub struct UrlMetricGroupCollection {
    groups: Vec<UrlMetricGroup>,
}

impl UrlMetricGroupCollection {
    pub fn new(groups: Vec<UrlMetricGroup>) -> Self {
        Self::from(groups)
    }

    /// True iff at least one group holds at least one URL Metric.
    pub fn is_any_group_populated(&self) -> bool {
        self.groups.iter().any(|group| !group.is_empty())
    }

    pub fn groups(&self) -> &[UrlMetricGroup] {
        &self.groups
    }

    pub fn iter(&self) -> std::slice::Iter<'_, UrlMetricGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// The group whose bucket contains `viewport_width`.
    pub fn group_for_viewport(&self, viewport_width: u32) -> Option<&UrlMetricGroup> {
        self.groups
            .iter()
            .find(|group| group.contains_viewport(viewport_width))
    }
}

impl From<Vec<UrlMetricGroup>> for UrlMetricGroupCollection {
    fn from(mut groups: Vec<UrlMetricGroup>) -> Self {
        groups.sort_by_key(|group| group.minimum_viewport_width);
        Self { groups }
    }
}

impl From<UrlMetricGroupCollection> for Vec<UrlMetricGroup> {
    fn from(collection: UrlMetricGroupCollection) -> Self {
        collection.groups
    }
}

impl<'a> IntoIterator for &'a UrlMetricGroupCollection {
    type Item = &'a UrlMetricGroup;
    type IntoIter = std::slice::Iter<'a, UrlMetricGroup>;

    fn into_iter(self) -> Self::IntoIter {
        self.groups.iter()
    }
}

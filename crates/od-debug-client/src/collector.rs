//! INP collection during a page visit.
//!
//! Every INP report with attribution is recorded together with the element
//! path of its target, computed right away so later DOM changes cannot
//! shift it. When the URL Metric is submitted, the recorded entries are
//! handed to the root-data extender once and the buffer is cleared.

use std::cell::RefCell;
use std::rc::Rc;

use od_debug_core::{ElementPath, InpData, Rating};
use serde::Serialize;
use tracing::{info, warn};

use crate::xpath::{LiveNode, create_xpath};

/// Prefix of every console message the collector writes.
pub const LOG_PREFIX: &str = "[OD Debug Helper]";

/// web-vitals INP attribution.
#[derive(Debug, Clone)]
pub struct InpAttribution<N> {
    pub interaction_target: String,
    pub interaction_target_element: Option<N>,
}

/// One web-vitals INP report.
#[derive(Debug, Clone)]
pub struct InpMetric<N> {
    pub value: f64,
    pub rating: Rating,
    /// Missing when the reporter was not the attribution build.
    pub attribution: Option<InpAttribution<N>>,
}

/// What the collector adds to the URL Metric root.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RootDataExtension {
    pub inp_data: Vec<InpData>,
}

/// Buffer of recorded INP entries for the current page visit.
#[derive(Debug, Clone, Default)]
pub struct InpCollector {
    entries: Rc<RefCell<Vec<InpData>>>,
}

impl InpCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hands `subscribe` a callback that records every report it is given.
    pub fn initialize<N, S>(&self, subscribe: S)
    where
        N: LiveNode + 'static,
        S: FnOnce(Box<dyn FnMut(InpMetric<N>)>),
    {
        let collector = self.clone();
        subscribe(Box::new(move |metric| {
            collector.record(&metric);
        }));
    }

    /// Records one report. Reports without attribution are ignored.
    pub fn record<N: LiveNode>(&self, metric: &InpMetric<N>) -> bool {
        let Some(attribution) = &metric.attribution else {
            return false;
        };

        let xpath = match &attribution.interaction_target_element {
            Some(element) => target_xpath(element, &attribution.interaction_target),
            None => {
                warn!(
                    interaction_target = %attribution.interaction_target,
                    "{LOG_PREFIX} INP report has no target element"
                );
                None
            }
        };

        self.entries.borrow_mut().push(InpData {
            value: metric.value,
            rating: metric.rating,
            interaction_target: attribution.interaction_target.clone(),
            xpath,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Hands the recorded entries to `extend_root_data` and clears the
    /// buffer. Does nothing when no entries were recorded.
    pub fn finalize<F>(&self, extend_root_data: F, is_debug: bool) -> bool
    where
        F: FnOnce(RootDataExtension),
    {
        let inp_data = std::mem::take(&mut *self.entries.borrow_mut());
        if inp_data.is_empty() {
            return false;
        }

        if is_debug {
            info!(count = inp_data.len(), data = ?inp_data, "{LOG_PREFIX} Sending INP data");
        }
        extend_root_data(RootDataExtension { inp_data });
        true
    }
}

fn target_xpath<N: LiveNode>(element: &N, interaction_target: &str) -> Option<ElementPath> {
    match create_xpath(element) {
        Ok(xpath) => Some(xpath),
        Err(e) => {
            warn!(%interaction_target, "{LOG_PREFIX} Failed to compute element path: {}", e);
            None
        }
    }
}

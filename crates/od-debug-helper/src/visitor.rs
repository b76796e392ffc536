//! The debug tag visitor.
//!
//! Marks the LCP element of every viewport bucket and the elements INP
//! interactions were reported on. It never asks for an element to be
//! tracked, so registering it leaves URL Metric collection unchanged.

use std::collections::HashSet;

use od_debug_core::marker::{LCP_POPOVER_TEXT, inp_popover_text};
use od_debug_core::{
    ElementPath, InpObservations, LocatorKind, Marker, MarkerReason, UrlMetricGroupCollection,
    ensure_anchor,
};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::{HelperConfig, InpAnnotation};
use crate::deferred;
use crate::processor::TagProcessor;
use crate::registry::{TagVisitor, TagVisitorContext};

/// Adds LCP and INP debug markers while a document is walked.
#[derive(Debug, Clone)]
pub struct DebugTagVisitor {
    inp_annotation: InpAnnotation,
    client_module_url: String,
    log_markers: bool,
    /// Marked (element, reason) pairs in the current document.
    annotated: HashSet<(ElementPath, MarkerReason)>,
    deferred_emitted: bool,
    /// Per-group observations keyed by element path, built on first use in
    /// each document.
    path_observations: Option<Vec<InpObservations>>,
}

impl DebugTagVisitor {
    pub fn new(config: &HelperConfig) -> Self {
        Self {
            inp_annotation: config.inp_annotation,
            client_module_url: config.client_module_url.clone(),
            log_markers: config.debug,
            annotated: HashSet::new(),
            deferred_emitted: false,
            path_observations: None,
        }
    }

    /// Markers placed in the current document.
    pub fn marker_count(&self) -> usize {
        self.annotated.len()
    }

    fn add_marker(
        &mut self,
        processor: &mut TagProcessor,
        xpath: &ElementPath,
        reason: MarkerReason,
        text: &str,
    ) {
        let kind = reason.kind();
        if !self.annotated.insert((xpath.clone(), reason)) {
            trace!(%xpath, ?kind, "element already marked");
            return;
        }

        let id = Uuid::new_v4();
        let style = processor.get_attribute("style");
        let anchor = ensure_anchor(style.as_deref(), id);
        if let Some(style) = &anchor.style {
            processor.set_attribute("style", style);
        }

        let marker = Marker::new(id, kind, anchor.name, text);
        processor.append_body_html(marker.to_html());

        if self.log_markers {
            info!(%xpath, ?kind, anchor = marker.element_anchor(), "placed debug marker");
        } else {
            debug!(%xpath, ?kind, "placed debug marker");
        }
    }

    fn annotate_inp_by_path(
        &mut self,
        processor: &mut TagProcessor,
        collection: &UrlMetricGroupCollection,
        xpath: &ElementPath,
    ) {
        let per_group = self.path_observations.get_or_insert_with(|| {
            collection
                .iter()
                .map(|group| group.inp_observations(LocatorKind::ElementPath))
                .collect()
        });

        let found: Vec<(String, String)> = per_group
            .iter()
            .filter_map(|observations| {
                let (locator, entries) = observations.get_key_value(xpath.as_str())?;
                // One marker per locator; the first observation labels it.
                let first = entries.first()?;
                Some((locator.clone(), inp_popover_text(first, None)))
            })
            .collect();

        for (locator, text) in found {
            self.add_marker(processor, xpath, MarkerReason::Inp(locator), &text);
        }
    }

    fn emit_deferred_annotation(
        &mut self,
        processor: &mut TagProcessor,
        collection: &UrlMetricGroupCollection,
    ) {
        if self.deferred_emitted {
            return;
        }
        self.deferred_emitted = true;

        let observations = collection.inp_observations(LocatorKind::InteractionTarget);
        if observations.is_empty() {
            debug!("no INP data, skipping deferred annotation");
            return;
        }

        match deferred::annotation_script(&observations, &self.client_module_url) {
            Ok(script) => {
                processor.append_body_html(script);
                debug!(locators = observations.len(), "queued deferred INP annotation");
            }
            Err(e) => warn!("Failed to build deferred INP annotation: {}", e),
        }
    }
}

impl TagVisitor for DebugTagVisitor {
    fn start_document(&mut self) {
        self.annotated.clear();
        self.deferred_emitted = false;
        self.path_observations = None;
    }

    fn visit(&mut self, context: &mut TagVisitorContext<'_>) -> bool {
        let collection = context.url_metric_group_collection;
        if !collection.is_any_group_populated() {
            return false;
        }

        let xpath = match context.processor.current_xpath() {
            Ok(xpath) => xpath,
            Err(e) => {
                warn!("Skipping element without a path: {}", e);
                return false;
            }
        };

        if collection
            .iter()
            .any(|group| group.lcp_path() == Some(&xpath))
        {
            self.add_marker(context.processor, &xpath, MarkerReason::Lcp, LCP_POPOVER_TEXT);
        }

        match self.inp_annotation {
            InpAnnotation::ServerPath => {
                self.annotate_inp_by_path(context.processor, collection, &xpath);
            }
            InpAnnotation::Deferred => {
                if context.processor.current_tag_name() == Some("BODY") {
                    self.emit_deferred_annotation(context.processor, collection);
                }
            }
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use od_debug_core::{InpData, Rating, UrlMetric, UrlMetricGroup};

    fn path(s: &str) -> ElementPath {
        s.parse().unwrap()
    }

    fn walk(visitor: &mut DebugTagVisitor, html: &str, collection: &UrlMetricGroupCollection) -> (String, usize) {
        let mut processor = TagProcessor::parse(html).unwrap();
        let mut tracked = 0;
        visitor.start_document();
        while processor.next_tag() {
            let mut context = TagVisitorContext {
                processor: &mut processor,
                url_metric_group_collection: collection,
            };
            if visitor.visit(&mut context) {
                tracked += 1;
            }
        }
        (processor.finish().unwrap(), tracked)
    }

    fn server_path_config() -> HelperConfig {
        HelperConfig {
            inp_annotation: InpAnnotation::ServerPath,
            ..HelperConfig::default()
        }
    }

    #[test]
    fn unpopulated_collection_changes_nothing() {
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, None).with_lcp_element(path("/HTML[1]/BODY[1]/IMG[1]")),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (html, tracked) = walk(&mut visitor, "<body><img src=\"a.jpg\"></body>", &collection);

        assert_eq!(tracked, 0);
        assert!(!html.contains("od-debug"));
        assert_eq!(visitor.marker_count(), 0);
    }

    #[test]
    fn marks_lcp_element_once_across_buckets() {
        let lcp = path("/HTML[1]/BODY[1]/IMG[1]");
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, Some(480))
                .with_lcp_element(lcp.clone())
                .with_url_metric(UrlMetric::new(400)),
            UrlMetricGroup::new(481, None)
                .with_lcp_element(lcp.clone())
                .with_url_metric(UrlMetric::new(1024)),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (html, tracked) = walk(&mut visitor, "<body><img src=\"a.jpg\"></body>", &collection);

        assert_eq!(tracked, 0);
        assert_eq!(visitor.marker_count(), 1);
        assert_eq!(html.matches("class=\"od-debug-dot lcp\"").count(), 1);
        assert!(html.contains("<img src=\"a.jpg\" style=\"anchor-name: --od-debug-element-"));
        assert!(html.contains(">LCP Element</div>"));
    }

    #[test]
    fn reuses_declared_anchor_name() {
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, None)
                .with_lcp_element(path("/HTML[1]/BODY[1]/IMG[1]"))
                .with_url_metric(UrlMetric::new(400)),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (html, _) = walk(
            &mut visitor,
            "<body><img style=\"anchor-name: --hero\"></body>",
            &collection,
        );

        assert!(html.contains("<img style=\"anchor-name: --hero\">"));
        assert!(html.contains("position-anchor: --hero;"));
        assert!(!html.contains("--od-debug-element-"));
    }

    #[test]
    fn server_path_marks_first_observation() {
        let button = path("/HTML[1]/BODY[1]/BUTTON[1]");
        let collection = UrlMetricGroupCollection::new(vec![UrlMetricGroup::new(0, None).with_url_metric(
            UrlMetric::new(400).with_inp_data(vec![
                InpData::new(340.0, Rating::Poor, "#cta").with_xpath(button.clone()),
                InpData::new(120.0, Rating::Good, "#cta").with_xpath(button.clone()),
            ]),
        )]);
        let mut visitor = DebugTagVisitor::new(&server_path_config());
        let (html, _) = walk(&mut visitor, "<body><button id=\"cta\">Buy</button></body>", &collection);

        assert_eq!(html.matches("class=\"od-debug-dot inp\"").count(), 1);
        assert!(html.contains("INP Element: (Value: 340) (Rating: poor)"));
        assert!(!html.contains("Value: 120"));
        assert!(!html.contains("<script"));
    }

    #[test]
    fn server_path_index_follows_each_document() {
        let first_button = path("/HTML[1]/BODY[1]/BUTTON[1]");
        let second_button = path("/HTML[1]/BODY[1]/BUTTON[2]");
        let collection_for = |xpath: &ElementPath| {
            UrlMetricGroupCollection::new(vec![UrlMetricGroup::new(0, None).with_url_metric(
                UrlMetric::new(400).with_inp_data(vec![
                    InpData::new(200.0, Rating::NeedsImprovement, "button").with_xpath(xpath.clone()),
                ]),
            )])
        };
        let page = "<body><button id=\"a\"></button><button id=\"b\"></button></body>";
        let mut visitor = DebugTagVisitor::new(&server_path_config());

        let (first, _) = walk(&mut visitor, page, &collection_for(&first_button));
        assert!(first.contains("<button id=\"a\" style=\"anchor-name: --od-debug-element-"));
        assert!(first.contains("<button id=\"b\"></button>"));

        let (second, _) = walk(&mut visitor, page, &collection_for(&second_button));
        assert!(second.contains("<button id=\"a\"></button>"));
        assert!(second.contains("<button id=\"b\" style=\"anchor-name: --od-debug-element-"));
        assert_eq!(visitor.marker_count(), 1);
    }

    #[test]
    fn deferred_mode_emits_script_once() {
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, Some(480)).with_url_metric(
                UrlMetric::new(400).with_inp_data(vec![InpData::new(120.0, Rating::Good, "#cta")]),
            ),
            UrlMetricGroup::new(481, None).with_url_metric(
                UrlMetric::new(1024).with_inp_data(vec![InpData::new(340.0, Rating::Poor, "#cta")]),
            ),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (html, _) = walk(&mut visitor, "<body><button id=\"cta\"></button></body>", &collection);

        assert_eq!(html.matches("id=\"od-debug-inp-annotations\"").count(), 1);
        assert!(html.contains(
            r##"{"#cta":[{"value":120.0,"rating":"good"},{"value":340.0,"rating":"poor"}]}"##
        ));
        assert!(!html.contains("od-debug-dot"));
    }

    #[test]
    fn deferred_mode_without_inp_data_emits_nothing() {
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, None).with_url_metric(UrlMetric::new(400)),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (html, _) = walk(&mut visitor, "<body><p>x</p></body>", &collection);
        assert!(!html.contains("<script"));
    }

    #[test]
    fn state_resets_between_documents() {
        let collection = UrlMetricGroupCollection::new(vec![
            UrlMetricGroup::new(0, None)
                .with_lcp_element(path("/HTML[1]/BODY[1]/IMG[1]"))
                .with_url_metric(UrlMetric::new(400)),
        ]);
        let mut visitor = DebugTagVisitor::new(&HelperConfig::default());
        let (first, _) = walk(&mut visitor, "<body><img></body>", &collection);
        let (second, _) = walk(&mut visitor, "<body><img></body>", &collection);

        assert_eq!(first.matches("od-debug-dot lcp").count(), 1);
        assert_eq!(second.matches("od-debug-dot lcp").count(), 1);
    }
}

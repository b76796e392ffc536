//! Deferred INP markers.
//!
//! Runs after the load event with observations keyed by interaction-target
//! selectors. Each selector the document resolves gets one marker, labelled
//! with the first observation and the element's tag name. Markers are
//! appended to `<body>` in one batch.

use od_debug_core::marker::inp_popover_text;
use od_debug_core::{InpObservations, Marker, MarkerKind, ensure_anchor};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::Result;

/// The document operations marker placement needs.
pub trait MarkerHost {
    type Element;

    /// First element matching a CSS selector. Invalid selectors resolve to
    /// nothing.
    fn query_selector(&self, selector: &str) -> Option<Self::Element>;

    fn tag_name(&self, element: &Self::Element) -> String;

    /// Inline `style` attribute, if any.
    fn style(&self, element: &Self::Element) -> Option<String>;

    fn set_style(&self, element: &Self::Element, style: &str) -> Result<()>;

    /// Appends every marker's dot and popover to the end of `<body>`.
    fn append_to_body(&self, markers: &[Marker]) -> Result<()>;
}

/// Places one INP marker per resolvable locator. Returns how many were placed.
pub fn annotate_inp<H: MarkerHost>(host: &H, observations: &InpObservations) -> Result<usize> {
    let mut markers = Vec::new();
    for (locator, entries) in observations {
        let Some(first) = entries.first() else {
            continue;
        };
        let Some(element) = host.query_selector(locator) else {
            debug!(%locator, "no element for INP locator");
            continue;
        };

        let id = Uuid::new_v4();
        let anchor = ensure_anchor(host.style(&element).as_deref(), id);
        if let Some(style) = &anchor.style
            && let Err(e) = host.set_style(&element, style)
        {
            warn!(%locator, "Failed to anchor INP element: {}", e);
            continue;
        }

        let tag = host.tag_name(&element);
        let text = inp_popover_text(first, Some(&tag));
        markers.push(Marker::new(id, MarkerKind::Inp, anchor.name, text));
    }

    if !markers.is_empty() {
        host.append_to_body(&markers)?;
    }
    debug!(placed = markers.len(), locators = observations.len(), "placed INP markers");
    Ok(markers.len())
}

/// [`annotate_inp`] over observations serialized as JSON.
pub fn annotate_inp_json<H: MarkerHost>(host: &H, json: &str) -> Result<usize> {
    let observations: InpObservations = serde_json::from_str(json)?;
    annotate_inp(host, &observations)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use od_debug_core::{InpObservation, Rating};

    use super::*;
    use crate::error::ClientError;

    #[derive(Default)]
    struct FakeDocument {
        /// selector -> (tag, style)
        elements: HashMap<String, (String, RefCell<Option<String>>)>,
        appended: RefCell<Vec<Vec<Marker>>>,
        read_only: bool,
    }

    impl FakeDocument {
        fn with(mut self, selector: &str, tag: &str, style: Option<&str>) -> Self {
            self.elements.insert(
                selector.to_string(),
                (tag.to_string(), RefCell::new(style.map(str::to_string))),
            );
            self
        }

        fn style_of(&self, selector: &str) -> Option<String> {
            self.elements[selector].1.borrow().clone()
        }
    }

    impl MarkerHost for FakeDocument {
        type Element = String;

        fn query_selector(&self, selector: &str) -> Option<String> {
            self.elements
                .contains_key(selector)
                .then(|| selector.to_string())
        }

        fn tag_name(&self, element: &String) -> String {
            self.elements[element].0.clone()
        }

        fn style(&self, element: &String) -> Option<String> {
            self.style_of(element)
        }

        fn set_style(&self, element: &String, style: &str) -> Result<()> {
            if self.read_only {
                return Err(ClientError::Dom("NoModificationAllowedError".to_string()));
            }
            *self.elements[element].1.borrow_mut() = Some(style.to_string());
            Ok(())
        }

        fn append_to_body(&self, markers: &[Marker]) -> Result<()> {
            self.appended.borrow_mut().push(markers.to_vec());
            Ok(())
        }
    }

    fn observations(entries: &[(&str, f64, Rating)]) -> InpObservations {
        let mut observations = InpObservations::new();
        for (locator, value, rating) in entries {
            observations
                .entry(locator.to_string())
                .or_default()
                .push(InpObservation {
                    value: *value,
                    rating: *rating,
                });
        }
        observations
    }

    #[test]
    fn labels_marker_with_tag_and_first_observation() {
        let document = FakeDocument::default().with("#cta", "BUTTON", None);
        let placed = annotate_inp(
            &document,
            &observations(&[("#cta", 120.0, Rating::Good), ("#cta", 340.0, Rating::Poor)]),
        )
        .unwrap();

        assert_eq!(placed, 1);
        let batches = document.appended.borrow();
        assert_eq!(batches.len(), 1);
        let marker = &batches[0][0];
        assert_eq!(marker.text(), "INP Element: BUTTON (Value: 120) (Rating: good)");
        assert_eq!(marker.kind(), MarkerKind::Inp);
        assert_eq!(
            document.style_of("#cta").unwrap(),
            format!("anchor-name: {};", marker.element_anchor())
        );
    }

    #[test]
    fn skips_unresolvable_locators() {
        let document = FakeDocument::default().with("#a", "A", None);
        let placed = annotate_inp(
            &document,
            &observations(&[("#gone", 90.0, Rating::Good), ("#a", 60.0, Rating::Good)]),
        )
        .unwrap();

        assert_eq!(placed, 1);
        assert_eq!(document.appended.borrow()[0].len(), 1);
    }

    #[test]
    fn nothing_to_place_appends_nothing() {
        let document = FakeDocument::default();
        let placed = annotate_inp(&document, &observations(&[("#gone", 90.0, Rating::Good)])).unwrap();
        assert_eq!(placed, 0);
        assert!(document.appended.borrow().is_empty());
    }

    #[test]
    fn keeps_existing_anchor_name() {
        let document =
            FakeDocument::default().with("#hero", "IMG", Some("anchor-name: --hero; width: 10px"));
        annotate_inp(&document, &observations(&[("#hero", 50.0, Rating::Good)])).unwrap();

        assert_eq!(
            document.style_of("#hero").as_deref(),
            Some("anchor-name: --hero; width: 10px")
        );
        assert_eq!(document.appended.borrow()[0][0].element_anchor(), "--hero");
    }

    #[test]
    fn unanchorable_element_is_skipped() {
        let document = FakeDocument {
            read_only: true,
            ..FakeDocument::default()
        }
        .with("#cta", "BUTTON", None);
        let placed = annotate_inp(&document, &observations(&[("#cta", 50.0, Rating::Good)])).unwrap();
        assert_eq!(placed, 0);
    }

    #[test]
    fn parses_embedded_json() {
        let document = FakeDocument::default().with("#cta", "BUTTON", None);
        let placed = annotate_inp_json(
            &document,
            r##"{"#cta":[{"value":120,"rating":"good"}],"#empty":[]}"##,
        )
        .unwrap();
        assert_eq!(placed, 1);

        assert!(matches!(
            annotate_inp_json(&document, "{not json"),
            Err(ClientError::Json(_))
        ));
    }
}

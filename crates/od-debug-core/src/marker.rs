//! Debug markers
//!
//! A marker is a dot button anchored to an annotated element plus a popover
//! the dot toggles. The dot is positioned with CSS anchor positioning, so
//! the annotated element must carry an `anchor-name`. An element that
//! already declares one keeps it; otherwise a fresh
//! `--od-debug-element-{uuid}` is prepended to its inline style.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use crate::index::InpObservation;

/// Accessible label shared by every dot.
pub const ARIA_LABEL: &str = "Optimization Detective";

/// Popover text of an LCP marker.
pub const LCP_POPOVER_TEXT: &str = "LCP Element";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKind {
    Lcp,
    Inp,
}

impl MarkerKind {
    /// Class added next to `od-debug-dot`.
    pub fn class_name(self) -> &'static str {
        match self {
            MarkerKind::Lcp => "lcp",
            MarkerKind::Inp => "inp",
        }
    }
}

/// Why an element was annotated. One marker per (element, reason).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MarkerReason {
    Lcp,
    /// INP data keyed by this locator.
    Inp(String),
}

impl MarkerReason {
    pub fn kind(&self) -> MarkerKind {
        match self {
            MarkerReason::Lcp => MarkerKind::Lcp,
            MarkerReason::Inp(_) => MarkerKind::Inp,
        }
    }
}

/// Popover text for an INP marker. The client knows the element's tag and
/// includes it; the server does not.
pub fn inp_popover_text(observation: &InpObservation, tag_name: Option<&str>) -> String {
    let mut text = String::from("INP Element:");
    if let Some(tag) = tag_name {
        let _ = write!(text, " {tag}");
    }
    let _ = write!(
        text,
        " (Value: {}) (Rating: {})",
        observation.value, observation.rating
    );
    text
}

static ANCHOR_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:^|;)\s*anchor-name\s*:\s*([^;]*)").unwrap());

/// The first dashed-ident of an `anchor-name` declaration in an inline
/// style. `none` and malformed values count as absent.
pub fn anchor_name(style: &str) -> Option<&str> {
    let value = ANCHOR_NAME_REGEX.captures(style)?.get(1)?.as_str();
    let first = value
        .split(',')
        .next()?
        .trim()
        .trim_end_matches("!important")
        .trim();
    (first.len() > 2
        && first.starts_with("--")
        && !first.contains(char::is_whitespace))
    .then_some(first)
}

/// Anchor name synthesized for an element without one.
pub fn element_anchor_name(id: Uuid) -> String {
    format!("--od-debug-element-{id}")
}

/// Result of [`ensure_anchor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorDeclaration {
    /// Anchor name the dot must target.
    pub name: String,
    /// Replacement inline style, when a declaration had to be added.
    pub style: Option<String>,
}

/// Reuses the element's anchor name, or prepends a synthesized one to its
/// inline style.
pub fn ensure_anchor(style: Option<&str>, id: Uuid) -> AnchorDeclaration {
    if let Some(existing) = style.and_then(anchor_name) {
        return AnchorDeclaration {
            name: existing.to_string(),
            style: None,
        };
    }

    let name = element_anchor_name(id);
    let style = format!("anchor-name: {name};{}", style.unwrap_or_default());
    AnchorDeclaration {
        name,
        style: Some(style),
    }
}

/// A dot plus popover pair for one annotated element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    id: Uuid,
    kind: MarkerKind,
    element_anchor: String,
    text: String,
}

impl Marker {
    pub fn new(
        id: Uuid,
        kind: MarkerKind,
        element_anchor: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id,
            kind,
            element_anchor: element_anchor.into(),
            text: text.into(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn kind(&self) -> MarkerKind {
        self.kind
    }

    /// Anchor name of the annotated element.
    pub fn element_anchor(&self) -> &str {
        &self.element_anchor
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn dot_anchor_name(&self) -> String {
        format!("--od-debug-dot-{}", self.id)
    }

    pub fn popover_id(&self) -> String {
        format!("od-debug-popover-{}", self.id)
    }

    /// Attributes of the `<button>` dot, in output order.
    pub fn dot_attributes(&self) -> Vec<(&'static str, String)> {
        let popover_id = self.popover_id();
        vec![
            ("class", format!("od-debug-dot {}", self.kind.class_name())),
            ("type", "button".to_string()),
            ("popovertarget", popover_id.clone()),
            ("popovertargetaction", "toggle".to_string()),
            (
                "style",
                format!(
                    "anchor-name: {}; position-anchor: {};",
                    self.dot_anchor_name(),
                    self.element_anchor
                ),
            ),
            ("aria-details", popover_id),
            ("aria-label", ARIA_LABEL.to_string()),
        ]
    }

    /// Attributes of the popover `<div>`. An empty value is a boolean attribute.
    pub fn popover_attributes(&self) -> Vec<(&'static str, String)> {
        vec![
            ("id", self.popover_id()),
            ("popover", String::new()),
            ("class", "od-debug-popover".to_string()),
            (
                "style",
                format!("position-anchor: {};", self.dot_anchor_name()),
            ),
        ]
    }

    /// Markup for appending to the end of the body.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<button");
        push_attributes(&mut html, &self.dot_attributes());
        html.push_str("></button><div");
        push_attributes(&mut html, &self.popover_attributes());
        html.push('>');
        html.push_str(&html_escape::encode_text(&self.text));
        html.push_str("</div>");
        html
    }
}

fn push_attributes(html: &mut String, attributes: &[(&'static str, String)]) {
    for (name, value) in attributes {
        if value.is_empty() {
            let _ = write!(html, " {name}");
        } else {
            let _ = write!(
                html,
                " {name}=\"{}\"",
                html_escape::encode_double_quoted_attribute(value)
            );
        }
    }
}

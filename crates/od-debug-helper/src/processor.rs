//! Forward-only tag processor over a parsed document.
//!
//! Parses a full document with html5ever into an rcdom tree, then walks the
//! elements depth-first in document order. While walking it keeps a stack
//! of per-parent tag counters, so the element path of the current tag is
//! known without looking back at the tree.
//!
//! Mutations are limited to the current element's attributes and to markup
//! queued for the end of `<body>`. Queued markup is only inserted by
//! [`TagProcessor::finish`], after the walk, so it never shifts the sibling
//! counts of elements still to be visited.

use std::collections::HashMap;
use std::rc::Rc;

use html5ever::serialize::{SerializeOpts, TraversalScope, serialize};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{Attribute, LocalName, ParseOpts, QualName, local_name, ns, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use od_debug_core::{ElementPath, PathError, PathSegment};
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// DOM `tagName` of an element: HTML elements are upper-cased, foreign
/// (SVG, MathML) elements keep their local name as written.
pub fn dom_tag_name(name: &QualName) -> String {
    if name.ns == ns!(html) {
        name.local.to_ascii_uppercase().to_string()
    } else {
        name.local.to_string()
    }
}

struct Frame {
    node: Handle,
    next_child: usize,
    /// Element children seen so far, by tag name.
    tag_counts: HashMap<String, usize>,
    /// False only for the document root, which has no path segment.
    element: bool,
}

impl Frame {
    fn new(node: Handle, element: bool) -> Self {
        Self {
            node,
            next_child: 0,
            tag_counts: HashMap::new(),
            element,
        }
    }
}

/// Walks the elements of one document and collects rewrites.
pub struct TagProcessor {
    dom: RcDom,
    stack: Vec<Frame>,
    breadcrumbs: Vec<PathSegment>,
    current: Option<Handle>,
    body_html: Vec<String>,
}

impl TagProcessor {
    /// Parses `html` as a full document.
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(Error::Parse)?;
        let root = Frame::new(dom.document.clone(), false);
        Ok(Self {
            dom,
            stack: vec![root],
            breadcrumbs: Vec::new(),
            current: None,
            body_html: Vec::new(),
        })
    }

    /// Advances to the next element in document order. Returns false once
    /// the document is exhausted.
    ///
    /// Template contents live outside the tree and are not visited.
    pub fn next_tag(&mut self) -> bool {
        while let Some(frame) = self.stack.last_mut() {
            let child = frame.node.children.borrow().get(frame.next_child).cloned();
            let Some(child) = child else {
                if let Some(done) = self.stack.pop()
                    && done.element
                {
                    self.breadcrumbs.pop();
                }
                continue;
            };
            frame.next_child += 1;

            let NodeData::Element { name, .. } = &child.data else {
                continue;
            };
            let tag = dom_tag_name(name);
            let count = frame.tag_counts.entry(tag.clone()).or_insert(0);
            *count += 1;
            let index = *count;

            self.breadcrumbs.push(PathSegment::new(tag, index));
            self.stack.push(Frame::new(child.clone(), true));
            self.current = Some(child);
            return true;
        }

        self.current = None;
        false
    }

    /// Element path of the current tag.
    pub fn current_xpath(&self) -> std::result::Result<ElementPath, PathError> {
        if self.current.is_none() {
            return Err(PathError::NoCurrentTag);
        }
        ElementPath::from_segments(&self.breadcrumbs)
    }

    /// DOM tag name of the current tag, e.g. `BODY` or `svg`.
    pub fn current_tag_name(&self) -> Option<&str> {
        self.current.as_ref()?;
        self.breadcrumbs.last().map(|segment| segment.tag.as_str())
    }

    /// Nesting depth of the current tag; `<html>` is 1.
    pub fn current_depth(&self) -> usize {
        if self.current.is_some() {
            self.breadcrumbs.len()
        } else {
            0
        }
    }

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let node = self.current.as_ref()?;
        let NodeData::Element { attrs, .. } = &node.data else {
            return None;
        };
        attrs
            .borrow()
            .iter()
            .find(|attr| str::eq_ignore_ascii_case(&attr.name.local, name))
            .map(|attr| attr.value.to_string())
    }

    /// Sets an attribute on the current tag. Returns false when there is no
    /// current tag.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let Some(node) = &self.current else {
            return false;
        };
        let NodeData::Element { attrs, .. } = &node.data else {
            return false;
        };

        let mut attrs = attrs.borrow_mut();
        if let Some(attr) = attrs
            .iter_mut()
            .find(|attr| str::eq_ignore_ascii_case(&attr.name.local, name))
        {
            attr.value = StrTendril::from_slice(value);
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: StrTendril::from_slice(value),
            });
        }
        true
    }

    /// Queues markup for the end of `<body>`.
    pub fn append_body_html(&mut self, html: impl Into<String>) {
        self.body_html.push(html.into());
    }

    /// Inserts queued markup and serializes the document.
    pub fn finish(self) -> Result<String> {
        if !self.body_html.is_empty() {
            match find_body(&self.dom.document) {
                Some(body) => {
                    for html in &self.body_html {
                        append_fragment(&body, html)?;
                    }
                    trace!(count = self.body_html.len(), "appended markup to body");
                }
                None => warn!(
                    count = self.body_html.len(),
                    "document has no body, dropping appended markup"
                ),
            }
        }

        let document: SerializableHandle = self.dom.document.clone().into();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        let mut out = Vec::new();
        serialize(&mut out, &document, opts).map_err(Error::Serialize)?;
        Ok(String::from_utf8(out)?)
    }
}

fn is_html_element(handle: &Handle, local: &LocalName) -> bool {
    matches!(&handle.data, NodeData::Element { name, .. } if name.ns == ns!(html) && name.local == *local)
}

fn find_body(document: &Handle) -> Option<Handle> {
    let html = document
        .children
        .borrow()
        .iter()
        .find(|child| is_html_element(child, &local_name!("html")))
        .cloned()?;
    html.children
        .borrow()
        .iter()
        .find(|child| is_html_element(child, &local_name!("body")))
        .cloned()
}

/// Parses `html` in a `<body>` context and appends the result to `body`.
fn append_fragment(body: &Handle, html: &str) -> Result<()> {
    let context = QualName::new(None, ns!(html), local_name!("body"));
    let fragment = parse_fragment(RcDom::default(), ParseOpts::default(), context, vec![], false)
        .from_utf8()
        .read_from(&mut html.as_bytes())
        .map_err(Error::Parse)?;

    // Fragment parsing wraps its output in a synthetic <html> root.
    let root = fragment.document.children.borrow().first().cloned();
    let Some(root) = root else {
        return Ok(());
    };
    let nodes = root.children.take();
    for node in nodes {
        node.parent.set(Some(Rc::downgrade(body)));
        body.children.borrow_mut().push(node);
    }
    Ok(())
}

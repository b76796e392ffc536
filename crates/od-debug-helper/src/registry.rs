//! Tag visitors and the registry the optimizer drives them from.

use indexmap::IndexMap;
use od_debug_core::UrlMetricGroupCollection;

use crate::processor::TagProcessor;

/// What a visitor sees for each element.
pub struct TagVisitorContext<'a> {
    pub processor: &'a mut TagProcessor,
    pub url_metric_group_collection: &'a UrlMetricGroupCollection,
}

/// Called once per element, in document order.
pub trait TagVisitor {
    /// Called before the first element of each document.
    fn start_document(&mut self) {}

    /// Returns true when the visitor wants the element tracked for later
    /// URL Metric collection.
    fn visit(&mut self, context: &mut TagVisitorContext<'_>) -> bool;
}

impl<F> TagVisitor for F
where
    F: FnMut(&mut TagVisitorContext<'_>) -> bool,
{
    fn visit(&mut self, context: &mut TagVisitorContext<'_>) -> bool {
        self(context)
    }
}

/// Registered visitors, run in registration order.
#[derive(Default)]
pub struct TagVisitorRegistry {
    visitors: IndexMap<String, Box<dyn TagVisitor>>,
}

impl TagVisitorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `visitor` under `id`, replacing any visitor with that id.
    pub fn register(&mut self, id: impl Into<String>, visitor: impl TagVisitor + 'static) {
        self.visitors.insert(id.into(), Box::new(visitor));
    }

    pub fn unregister(&mut self, id: &str) -> bool {
        self.visitors.shift_remove(id).is_some()
    }

    pub fn is_registered(&self, id: &str) -> bool {
        self.visitors.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Box<dyn TagVisitor>)> {
        self.visitors.iter_mut().map(|(id, visitor)| (id.as_str(), visitor))
    }
}

//! Server-side debug overlay for Optimization Detective
//!
//! While a page is rewritten, [`DebugTagVisitor`] marks the LCP element of
//! every viewport bucket and the elements INP interactions were reported
//! on. Markers are dot buttons anchored to the element with CSS anchor
//! positioning, each toggling a popover that describes the finding.
//!
//! ```no_run
//! use od_debug_helper::{HelperConfig, TagVisitorRegistry, optimize, register_debug_helper};
//! use od_debug_core::UrlMetricGroupCollection;
//!
//! # fn main() -> od_debug_helper::Result<()> {
//! let collection: UrlMetricGroupCollection = serde_json::from_str("[]")?;
//! let mut registry = TagVisitorRegistry::new();
//! if let Some(registration) = register_debug_helper(&mut registry, &HelperConfig::default()) {
//!     assert!(registration.use_attribution_build);
//! }
//! let html = optimize("<p>hello</p>", &collection, &mut registry)?;
//! # Ok(())
//! # }
//! ```

mod error;

pub mod config;
pub mod deferred;
pub mod extension;
pub mod processor;
pub mod registry;
pub mod visitor;

pub use config::{HelperConfig, InpAnnotation};
pub use error::{Error, Result};
pub use extension::HelperRegistration;
pub use processor::TagProcessor;
pub use registry::{TagVisitor, TagVisitorContext, TagVisitorRegistry};
pub use visitor::DebugTagVisitor;

use od_debug_core::UrlMetricGroupCollection;
use tracing::{debug, trace};

/// Registry id of the debug visitor.
pub const DEBUG_VISITOR_ID: &str = "od-debug-helper";

/// Registers the debug visitor unless the config disables it.
///
/// When registered, returns what the host must additionally do: load the
/// web-vitals attribution build and import the collector extension module.
pub fn register_debug_helper(
    registry: &mut TagVisitorRegistry,
    config: &HelperConfig,
) -> Option<HelperRegistration> {
    if !config.enabled {
        debug!("debug helper disabled by config");
        return None;
    }
    registry.register(DEBUG_VISITOR_ID, DebugTagVisitor::new(config));
    Some(HelperRegistration::new(config))
}

/// Walks every element of `html` through the registered visitors and
/// returns the rewritten document.
pub fn optimize(
    html: &str,
    collection: &UrlMetricGroupCollection,
    registry: &mut TagVisitorRegistry,
) -> Result<String> {
    let mut processor = TagProcessor::parse(html)?;
    for (_, visitor) in registry.iter_mut() {
        visitor.start_document();
    }

    let mut elements = 0usize;
    let mut tracked = 0usize;
    while processor.next_tag() {
        elements += 1;
        let mut context = TagVisitorContext {
            processor: &mut processor,
            url_metric_group_collection: collection,
        };
        for (id, visitor) in registry.iter_mut() {
            if visitor.visit(&mut context) {
                trace!(visitor = id, "element tracked");
                tracked += 1;
            }
        }
    }

    debug!(elements, tracked, visitors = registry.len(), "document visited");
    processor.finish()
}

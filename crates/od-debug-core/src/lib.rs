//! Shared types for the Optimization Detective debug overlay
//!
//! The overlay correlates two things by equality of an [`ElementPath`]:
//! - markers inserted while the server rewrites a page, and
//! - INP interactions observed in the browser.
//!
//! This crate holds everything both halves agree on:
//! - the element path format ([`element_path`])
//! - the URL Metric data model and its group collection ([`metrics`])
//! - the per-bucket query surface over that collection ([`index`])
//! - debug marker construction and anchor-name handling ([`marker`])
//! - the `inpData` schema extension ([`schema`])

mod error;

pub mod element_path;
pub mod index;
pub mod marker;
pub mod metrics;
pub mod schema;

pub use element_path::{ELEMENT_NODE, ElementPath, PathSegment};
pub use error::{PathError, Result};
pub use index::{InpObservation, InpObservations, LocatorKind, encode_observations};
pub use marker::{AnchorDeclaration, Marker, MarkerKind, MarkerReason, anchor_name, ensure_anchor};
pub use metrics::{InpData, LcpElement, Rating, UrlMetric, UrlMetricGroup, UrlMetricGroupCollection};

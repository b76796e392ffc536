//! WASM client for the Optimization Detective debug overlay
//!
//! Two jobs in the browser:
//! - while the page is used, record INP reports together with the element
//!   path of each interaction target ([`collector`])
//! - after load, place INP markers on the elements the server could only
//!   name by selector ([`annotate`])
//!
//! DOM access goes through the [`xpath::LiveNode`] and
//! [`annotate::MarkerHost`] traits; the `web_sys` implementations and the
//! JavaScript exports are only compiled for `wasm32`.

mod error;

pub mod annotate;
pub mod collector;
pub mod xpath;

#[cfg(target_arch = "wasm32")]
mod web;

pub use annotate::{MarkerHost, annotate_inp, annotate_inp_json};
pub use collector::{InpAttribution, InpCollector, InpMetric, RootDataExtension};
pub use error::{ClientError, Result};
pub use xpath::{LiveNode, create_xpath};

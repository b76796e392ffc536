//! Browser bindings: `web_sys` implementations of the DOM traits and the
//! module's JavaScript exports.
//!
//! Exports, as the extension module interface expects them:
//! - `initialize({ onINP })` subscribes to web-vitals INP reports
//! - `finalize({ extendRootData, isDebug })` hands recorded entries over
//! - `annotateInp(data)` places deferred INP markers

use std::sync::Once;

use js_sys::{Function, JSON, Reflect};
use od_debug_core::{Marker, Rating};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::annotate::{MarkerHost, annotate_inp_json};
use crate::collector::{InpAttribution, InpCollector, InpMetric, LOG_PREFIX};
use crate::error::{ClientError, Result};
use crate::xpath::LiveNode;

impl LiveNode for web_sys::Node {
    fn node_type(&self) -> u16 {
        web_sys::Node::node_type(self)
    }

    fn tag_name(&self) -> Option<String> {
        self.dyn_ref::<web_sys::Element>().map(web_sys::Element::tag_name)
    }

    fn parent_node(&self) -> Option<Self> {
        web_sys::Node::parent_node(self)
    }

    fn previous_sibling(&self) -> Option<Self> {
        web_sys::Node::previous_sibling(self)
    }
}

impl From<JsValue> for ClientError {
    fn from(value: JsValue) -> Self {
        ClientError::Dom(value.as_string().unwrap_or_else(|| format!("{value:?}")))
    }
}

impl From<ClientError> for JsValue {
    fn from(error: ClientError) -> Self {
        JsValue::from_str(&format!("{LOG_PREFIX} {error}"))
    }
}

/// Places markers in the live document.
struct DocumentHost {
    document: web_sys::Document,
}

impl DocumentHost {
    fn current() -> Result<Self> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| ClientError::Dom("no document".to_string()))?;
        Ok(Self { document })
    }

    fn create(
        &self,
        tag: &str,
        attributes: &[(&'static str, String)],
        text: Option<&str>,
    ) -> Result<web_sys::Element> {
        let element = self.document.create_element(tag)?;
        for (name, value) in attributes {
            element.set_attribute(name, value)?;
        }
        if let Some(text) = text {
            element.set_text_content(Some(text));
        }
        Ok(element)
    }
}

impl MarkerHost for DocumentHost {
    type Element = web_sys::Element;

    fn query_selector(&self, selector: &str) -> Option<web_sys::Element> {
        self.document.query_selector(selector).ok().flatten()
    }

    fn tag_name(&self, element: &web_sys::Element) -> String {
        element.tag_name()
    }

    fn style(&self, element: &web_sys::Element) -> Option<String> {
        element.get_attribute("style")
    }

    fn set_style(&self, element: &web_sys::Element, style: &str) -> Result<()> {
        element.set_attribute("style", style)?;
        Ok(())
    }

    fn append_to_body(&self, markers: &[Marker]) -> Result<()> {
        let body = self
            .document
            .body()
            .ok_or_else(|| ClientError::Dom("document has no body".to_string()))?;
        let fragment = self.document.create_document_fragment();
        for marker in markers {
            let dot = self.create("button", &marker.dot_attributes(), None)?;
            let popover = self.create("div", &marker.popover_attributes(), Some(marker.text()))?;
            fragment.append_child(&dot)?;
            fragment.append_child(&popover)?;
        }
        body.append_child(&fragment)?;
        Ok(())
    }
}

thread_local! {
    static COLLECTOR: InpCollector = InpCollector::new();
}

static TRACING: Once = Once::new();

fn install_tracing() {
    TRACING.call_once(|| {
        tracing_wasm::set_as_global_default_with_config(
            tracing_wasm::WASMLayerConfigBuilder::new()
                .set_max_level(tracing::Level::INFO)
                .build(),
        );
    });
}

fn get(target: &JsValue, key: &str) -> std::result::Result<JsValue, JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
}

/// Reads a web-vitals `INPMetricWithAttribution`. `None` when the value or
/// rating is missing or unrecognised.
fn read_metric(metric: &JsValue) -> Option<InpMetric<web_sys::Node>> {
    let value = get(metric, "value").ok()?.as_f64()?;
    let rating: Rating = get(metric, "rating").ok()?.as_string()?.parse().ok()?;
    let attribution = get(metric, "attribution")
        .ok()
        .filter(JsValue::is_object)
        .map(|attribution| InpAttribution {
            interaction_target: get(&attribution, "interactionTarget")
                .ok()
                .and_then(|target| target.as_string())
                .unwrap_or_default(),
            interaction_target_element: get(&attribution, "interactionTargetElement")
                .ok()
                .and_then(|element| element.dyn_into::<web_sys::Node>().ok()),
        });
    Some(InpMetric {
        value,
        rating,
        attribution,
    })
}

/// Subscribes to INP reports through `args.onINP`.
#[wasm_bindgen]
pub fn initialize(args: JsValue) -> std::result::Result<(), JsValue> {
    install_tracing();
    let on_inp: Function = get(&args, "onINP")?.dyn_into()?;

    let collector = COLLECTOR.with(InpCollector::clone);
    let mut outcome = Ok(());
    collector.initialize(|mut record: Box<dyn FnMut(InpMetric<web_sys::Node>)>| {
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |metric: JsValue| {
            match read_metric(&metric) {
                Some(metric) => record(metric),
                None => tracing::warn!("{LOG_PREFIX} Ignoring unreadable INP report"),
            }
        });
        outcome = on_inp
            .call1(&JsValue::NULL, callback.as_ref().unchecked_ref())
            .map(drop);
        // web-vitals keeps the callback for the lifetime of the page.
        callback.forget();
    });
    outcome
}

/// Hands recorded INP entries to `args.extendRootData`.
#[wasm_bindgen]
pub fn finalize(args: JsValue) -> std::result::Result<(), JsValue> {
    let extend_root_data: Function = get(&args, "extendRootData")?.dyn_into()?;
    let is_debug = get(&args, "isDebug")?.as_bool().unwrap_or(false);

    let collector = COLLECTOR.with(InpCollector::clone);
    let mut outcome = Ok(());
    collector.finalize(
        |extension| {
            outcome = serde_json::to_string(&extension)
                .map_err(|e| JsValue::from(ClientError::from(e)))
                .and_then(|json| JSON::parse(&json))
                .and_then(|data| extend_root_data.call1(&JsValue::NULL, &data))
                .map(drop);
        },
        is_debug,
    );
    outcome
}

/// Places INP markers for `data`, an object mapping interaction-target
/// selectors to observation lists. Returns how many were placed.
#[wasm_bindgen(js_name = annotateInp)]
pub fn annotate_inp(data: JsValue) -> std::result::Result<usize, JsValue> {
    install_tracing();
    let json: String = JSON::stringify(&data)?.into();
    let host = DocumentHost::current()?;
    Ok(annotate_inp_json(&host, &json)?)
}

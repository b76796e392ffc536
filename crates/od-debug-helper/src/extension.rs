//! What the host's detection script needs from the debug helper.
//!
//! The client collector only records INP reports that carry attribution,
//! so the host must load the web-vitals attribution build. The collector
//! itself reaches the page as an extension module: a small ES module whose
//! `initialize`/`finalize` exports instantiate the wasm client before
//! forwarding to it.

use crate::config::HelperConfig;
use crate::error::Result;

/// Version appended to extension module URLs for cache busting.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Host-side requests made by a registered debug helper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperRegistration {
    /// Load the web-vitals attribution build, so INP reports name their
    /// target element.
    pub use_attribution_build: bool,
    /// Modules the detection script imports and drives through
    /// `initialize({ onINP })` and `finalize({ extendRootData, isDebug })`.
    pub extension_module_urls: Vec<String>,
}

impl HelperRegistration {
    pub fn new(config: &HelperConfig) -> Self {
        Self {
            use_attribution_build: true,
            extension_module_urls: vec![versioned_url(&config.extension_module_url)],
        }
    }

    /// Appends this helper's modules to URLs other extensions registered.
    pub fn extend_module_urls(&self, urls: &mut Vec<String>) {
        for url in &self.extension_module_urls {
            if !urls.contains(url) {
                urls.push(url.clone());
            }
        }
    }
}

/// `url` with a `ver` query parameter.
pub fn versioned_url(url: &str) -> String {
    let (base, fragment) = match url.split_once('#') {
        Some((base, fragment)) => (base, Some(fragment)),
        None => (url, None),
    };
    let separator = if base.contains('?') { '&' } else { '?' };
    let mut versioned = format!("{base}{separator}ver={VERSION}");
    if let Some(fragment) = fragment {
        versioned.push('#');
        versioned.push_str(fragment);
    }
    versioned
}

/// Source of the extension module served at
/// [`HelperConfig::extension_module_url`].
///
/// wasm-bindgen exports are unusable until the module's default `init` has
/// resolved, so both hooks wait for it.
pub fn extension_module(client_module_url: &str) -> Result<String> {
    let module_url = serde_json::to_string(client_module_url)?;
    Ok(format!(
        r#"import init, {{ initialize as initializeClient, finalize as finalizeClient }} from {module_url};

const ready = init();

export async function initialize(args) {{
  await ready;
  initializeClient(args);
}}

export async function finalize(args) {{
  await ready;
  finalizeClient(args);
}}
"#
    ))
}

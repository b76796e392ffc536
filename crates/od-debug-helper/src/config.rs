//! Configuration file discovery and parsing
//!
//! Searches for `.config/od-debug.yaml` walking up from the current
//! directory. Every field is optional; a missing file means defaults.

use std::env;
use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};

const CONFIG_DIR: &str = ".config";
const CONFIG_FILE_YAML: &str = "od-debug.yaml";

/// Where the client module is served from when not configured.
pub const DEFAULT_CLIENT_MODULE_URL: &str = "/od-debug-client.js";

/// Where the extension module shim is served from when not configured.
pub const DEFAULT_EXTENSION_MODULE_URL: &str = "/od-debug-extension.js";

/// How INP markers are placed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InpAnnotation {
    /// Embed observations keyed by interaction target and let the client
    /// module place markers after load.
    #[default]
    Deferred,
    /// Place markers during the server walk, matching by element path.
    ServerPath,
}

/// Debug helper configuration from `.config/od-debug.yaml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct HelperConfig {
    /// Register the debug visitor at all.
    pub enabled: bool,

    pub inp_annotation: InpAnnotation,

    /// URL the deferred annotation script imports the client module from
    pub client_module_url: String,

    /// URL the detection script imports the INP collector extension from
    pub extension_module_url: String,

    /// Log every marker placed at info level
    pub debug: bool,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inp_annotation: InpAnnotation::default(),
            client_module_url: DEFAULT_CLIENT_MODULE_URL.to_string(),
            extension_module_url: DEFAULT_EXTENSION_MODULE_URL.to_string(),
            debug: false,
        }
    }
}

impl HelperConfig {
    /// Discover and load configuration from the current directory
    pub fn discover() -> Result<Option<(Utf8PathBuf, Self)>> {
        let cwd = env::current_dir()?;
        let cwd = Utf8PathBuf::try_from(cwd).map_err(|e| {
            eyre!(
                "Current directory is not valid UTF-8: {}",
                e.as_path().display()
            )
        })?;
        Self::discover_from(&cwd)
    }

    /// Discover and load configuration walking up from `start`
    pub fn discover_from(start: &Utf8Path) -> Result<Option<(Utf8PathBuf, Self)>> {
        match find_config_file(start) {
            Some(path) => {
                let config = Self::load(&path)?;
                Ok(Some((path, config)))
            }
            None => Ok(None),
        }
    }

    /// Load configuration from a file path
    pub fn load(path: &Utf8Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| eyre!("Failed to read {}: {}", path, e))?;
        Self::from_yaml(&content).map_err(|e| eyre!("Failed to parse {}: {}", path, e))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty file parses as YAML null.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Search for `.config/od-debug.yaml` walking up from `start`
fn find_config_file(start: &Utf8Path) -> Option<Utf8PathBuf> {
    let mut current = start;
    loop {
        let yaml_file = current.join(CONFIG_DIR).join(CONFIG_FILE_YAML);
        if yaml_file.exists() {
            return Some(yaml_file);
        }
        current = current.parent()?;
    }
}

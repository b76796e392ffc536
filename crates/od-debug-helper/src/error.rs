//! Error types for document annotation.

use od_debug_core::PathError;

/// Errors that abort rewriting a document.
///
/// Per-element problems (an unreadable path, a marker that cannot be
/// built) are logged and skipped instead, so a bad node never costs the
/// whole page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be read as HTML.
    #[error("failed to parse document: {0}")]
    Parse(#[source] std::io::Error),

    /// The rewritten tree could not be written back out.
    #[error("failed to serialize document: {0}")]
    Serialize(#[source] std::io::Error),

    /// Serialized output was not UTF-8.
    #[error("serialized document is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for document annotation.
pub type Result<T> = std::result::Result<T, Error>;

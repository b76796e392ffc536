//! Error types for element path computation and parsing.

/// Errors produced while computing or parsing an element path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The handle passed to path computation is not an element node.
    #[error("invalid element provided: expected an element node, got node type {node_type}")]
    NotAnElement { node_type: u16 },

    /// The string is not a well-formed element path.
    #[error("malformed element path {path:?}: {reason}")]
    Malformed { path: String, reason: &'static str },

    /// The tag processor is not positioned on an element.
    #[error("no current tag: the processor is not positioned on an element")]
    NoCurrentTag,
}

/// Result type for element path operations.
pub type Result<T, E = PathError> = std::result::Result<T, E>;

use od_debug_core::PathError;

/// Errors raised in the browser half of the overlay.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("invalid INP data: {0}")]
    Json(#[from] serde_json::Error),

    /// A DOM call threw.
    #[error("DOM error: {0}")]
    Dom(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;

//! Render error taxonomy.

/// Error type for render operations.
///
/// Whether an error is recoverable depends on when it happens, not on its
/// variant: anything returned before the first output byte leaves the
/// pipeline can fail open, anything after it truncates the response.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Template error: {0}")]
    Template(String),

    #[error("Render failed: {0}")]
    Render(String),

    #[error("Chunk '{0}' is still pending in a synchronous render")]
    Suspended(String),

    #[error("Render finished before the end-of-shell marker was observed")]
    ShellIncomplete,

    #[error("Shell is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("Streaming error: {0}")]
    Stream(String),

    #[error("Response truncated after the shell was sent: {0}")]
    Truncated(String),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl RenderError {
    /// Build a render failure from any displayable error.
    pub fn render(err: impl std::fmt::Display) -> Self {
        Self::Render(err.to_string())
    }
}

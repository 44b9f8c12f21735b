//! Typed errors for the research library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that can occur during research operations.
///
/// Note that most failures never reach the caller of
/// [`Researcher::run`](crate::Researcher::run): per-query and per-round
/// failures are logged and narrated, then swallowed. This type is the
/// contract between capability implementations and the orchestrator.
#[derive(Debug, Error)]
pub enum ResearchError {
    /// Model provider unavailable or returned an error
    #[error("AI service error: {0}")]
    AI(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Retrieval index unavailable or failed
    #[error("retrieval error: {0}")]
    Retrieval(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Provider identifier not recognized or not compiled in
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Model response did not match the expected JSON contract
    #[error("malformed model response: {0}")]
    MalformedResponse(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Configuration error
    #[error("config error: {0}")]
    Config(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Result type alias for research operations.
pub type Result<T> = std::result::Result<T, ResearchError>;

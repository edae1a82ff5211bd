//! Error types for optimizer operations.
//!
//! No error in this crate is fatal. Port implementations report failures
//! through [`OptimizeError`]; the reconcilers log and drop them so the
//! worst outcome of any failure is "no speculation this page view".

/// Unified error type for all optimizer ports and helpers.
#[derive(Debug, thiserror::Error)]
pub enum OptimizeError {
    /// A string did not name one of the four optimization modes.
    #[error("Unknown optimization mode: {0}")]
    UnknownMode(String),

    /// A link reference or base URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Durable key/value storage rejected a read or write.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The document refused a query or mutation.
    #[error("Document error: {0}")]
    Document(String),

    /// The navigation layer rejected a warm request.
    #[error("Navigation error: {0}")]
    Navigation(String),

    /// Capability detection itself failed.
    #[error("Capability error: {0}")]
    Capability(String),

    /// A rule document could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration failed to load or validate.
    #[error("Config error: {0}")]
    Config(String),

    /// The telemetry sink rejected a tag.
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

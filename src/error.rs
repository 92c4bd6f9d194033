//! Error types for rendering and attaching output

use thiserror::Error;

/// Failure while turning a MIME payload into a fragment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// No registered renderer (and no fallback) accepts any of the types
    #[error("Renderer not found for mimetypes [{}]", .mimetypes.join(", "))]
    NoRenderer { mimetypes: Vec<String> },

    /// Payload has the wrong shape for its MIME type
    #[error("Invalid {mimetype} payload: {reason}")]
    InvalidPayload { mimetype: String, reason: String },

    /// A renderer or target panicked
    #[error("Renderer panicked: {0}")]
    Panicked(String),
}

/// The render target refused a fragment
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to attach output: {0}")]
pub struct AttachError(pub String);

/// Failure reported by a script engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{name}: {message}")]
pub struct ScriptError {
    pub name: String,
    pub message: String,
}

impl ScriptError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Result type for rendering operations
pub type Result<T> = std::result::Result<T, RenderError>;

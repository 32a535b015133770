//! Error types for assembly, preview and capture

use thiserror::Error;

/// Result type alias for pagesmith operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering or exporting
#[derive(Error, Debug)]
pub enum Error {
    /// The rendering surface has no renderable root
    #[error("Nothing to capture: the preview has no content")]
    ContentUnavailable,

    /// No slide container matched the configured selector
    #[error("No slide container found (looked for `{0}`)")]
    ContainerNotFound(String),

    /// The slide container holds fewer than two slides
    #[error("At least two slides are needed for an animation, found {found}")]
    InsufficientFrames { found: usize },

    /// The rasterizer or an encoder produced no output
    #[error("Encoding failed: {0}")]
    EncodingFailure(String),

    /// Another capture is still running
    #[error("A capture is already in progress")]
    Busy,

    /// An embedded resource could not be loaded
    #[error("Failed to load resource {src}: {reason}")]
    ResourceError { src: String, reason: String },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// Reading or writing a local file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short, user-facing title used when the error is surfaced as a notice.
    pub fn title(&self) -> &'static str {
        match self {
            Error::ContentUnavailable => "Nothing to capture",
            Error::ContainerNotFound(_) => "No slides found",
            Error::InsufficientFrames { .. } => "Not enough slides",
            Error::EncodingFailure(_) => "Export failed",
            Error::Busy => "Export in progress",
            Error::ResourceError { .. } => "Resource unavailable",
            Error::ConfigError(_) => "Invalid settings",
            Error::Io(_) => "File error",
        }
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::EncodingFailure(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigError(err.to_string())
    }
}

use thiserror::Error;

/// Custom error types for vidprep
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Probe error for '{path}': {message}")]
    Probe { path: String, message: String },

    #[error("Frame decode error: {0}")]
    Decode(String),

    #[error("Command execution failed: {0}")]
    CommandExecution(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("No metadata rows found at {0}")]
    NoRowsFound(String),
}

/// Result type for vidprep operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Shorthand for a probe failure tied to a specific media path.
    pub fn probe(path: impl std::fmt::Display, message: impl Into<String>) -> Self {
        CoreError::Probe {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

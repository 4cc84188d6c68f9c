/// Core error types for Reverb EQ
use thiserror::Error;

/// Result type alias using `ReverbError`
pub type Result<T> = std::result::Result<T, ReverbError>;

/// Core error type shared across crates
#[derive(Error, Debug)]
pub enum ReverbError {
    /// Audio processing errors
    #[error("Audio error: {0}")]
    Audio(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ReverbError {
    /// Create an audio error
    pub fn audio(msg: impl Into<String>) -> Self {
        Self::Audio(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

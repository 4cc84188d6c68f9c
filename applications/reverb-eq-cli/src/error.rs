/// CLI error types
use reverb_core::ReverbError;
use reverb_eq::EqError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Equalizer error: {0}")]
    Eq(#[from] EqError),

    #[error("Audio error: {0}")]
    Core(#[from] ReverbError),
}

impl From<config::ConfigError> for CliError {
    fn from(err: config::ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

/// Reverb EQ command-line host
///
/// Loads an impulse response, runs the gain-corrected cascade over one
/// reference channel and inspects the corrected response.
pub mod commands;
pub mod config;
pub mod error;
pub mod wav;

pub use config::CliConfig;
pub use error::{CliError, Result};

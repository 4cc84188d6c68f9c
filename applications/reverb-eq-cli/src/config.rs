/// CLI configuration
use crate::error::{CliError, Result};
use reverb_core::SampleRate;
use reverb_eq::{Equalizer, EqualizerSettings, MAX_BANDS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG_FILE: &str = "reverb-eq.toml";

/// Environment variable prefix (`REVERB_EQ__SAMPLE_RATE=96000`)
pub const ENV_PREFIX: &str = "REVERB_EQ";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CliConfig {
    /// Sample rate for `response` and `gains` (`apply` uses the file's rate)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default)]
    pub equalizer: EqualizerSettings,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            equalizer: EqualizerSettings::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `reverb-eq.toml` is read if
    /// present. `REVERB_EQ__…` variables override both.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(CliError::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (REVERB_EQ__EQUALIZER__CORRECTION__ITERATIONS=8)
        settings = settings.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: Self = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CliError::Config("Sample rate must be positive".to_string()));
        }

        let bands = self.equalizer.bands.len();
        if bands == 0 || bands > MAX_BANDS {
            return Err(CliError::Config(format!(
                "Equalizer needs 1-{} bands, got {}",
                MAX_BANDS, bands
            )));
        }

        Ok(())
    }

    /// Override the configured sample rate
    pub fn with_sample_rate(mut self, sample_rate: Option<u32>) -> Result<Self> {
        if let Some(sample_rate) = sample_rate {
            self.sample_rate = sample_rate;
            self.validate()?;
        }
        Ok(self)
    }

    /// Build the configured cascade at `sample_rate`
    pub fn equalizer(&self, sample_rate: SampleRate) -> Result<Equalizer> {
        Ok(Equalizer::from_settings(&self.equalizer, sample_rate)?)
    }
}

// Default values
fn default_sample_rate() -> u32 {
    SampleRate::DVD_QUALITY.as_hz()
}

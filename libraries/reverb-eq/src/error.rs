//! Error types for the equalizer

use std::fmt;
use thiserror::Error;

/// Result type for equalizer operations
pub type Result<T> = std::result::Result<T, EqError>;

/// Filter parameter named in validation errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterParameter {
    /// Nominal frequency in Hz
    Frequency,
    /// Quality factor
    Q,
    /// Linear gain factor
    Gain,
}

impl fmt::Display for FilterParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Frequency => "frequency",
            Self::Q => "Q",
            Self::Gain => "gain",
        };
        f.write_str(name)
    }
}

/// Errors that can occur while configuring or running the equalizer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EqError {
    /// A filter setter received a value outside its valid range.
    /// The filter keeps its previous parameters.
    #[error("Parameter out of range: {parameter} = {value}")]
    ParameterOutOfRange {
        /// Which parameter was rejected
        parameter: FilterParameter,
        /// The rejected value
        value: f64,
    },

    /// Band index outside `[0, count)`
    #[error("Invalid filter index {index} (equalizer has {count} bands)")]
    InvalidFilter {
        /// Requested band index
        index: usize,
        /// Number of bands in the cascade
        count: usize,
    },

    /// Buffer does not carry exactly one channel
    #[error("Invalid channel count: {0} (expected a single reference channel)")]
    ChannelCount(u16),

    /// The correction system has no usable pivot
    #[error("Singular correction system: no pivot in column {column}")]
    SingularSystem {
        /// Column in which elimination failed
        column: usize,
    },

    /// Sample rate cannot host a biquad design
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Band count outside `1..=MAX_BANDS`
    #[error("Invalid band count: {0} (must be 1-{max})", max = crate::MAX_BANDS)]
    BandCount(usize),
}

impl EqError {
    pub(crate) fn out_of_range(parameter: FilterParameter, value: f64) -> Self {
        Self::ParameterOutOfRange { parameter, value }
    }
}

impl From<EqError> for reverb_core::ReverbError {
    fn from(err: EqError) -> Self {
        match err {
            EqError::ParameterOutOfRange { .. }
            | EqError::InvalidFilter { .. }
            | EqError::ChannelCount(_)
            | EqError::InvalidSampleRate(_)
            | EqError::BandCount(_) => reverb_core::ReverbError::invalid_input(err.to_string()),
            EqError::SingularSystem { .. } => reverb_core::ReverbError::audio(err.to_string()),
        }
    }
}

//! Serializable equalizer configuration
//!
//! Hosts persist and load these structures; [`Equalizer::from_settings`]
//! pushes every value through the validated setters.
//!
//! [`Equalizer::from_settings`]: crate::Equalizer::from_settings

use crate::filter::{FilterKind, DEFAULT_GAIN, DEFAULT_Q};
use serde::{Deserialize, Serialize};

/// Fixed correction budget used when nothing else is configured
pub const CORRECTION_ITERATIONS: usize = 5;

/// Upper bound accepted for the correction budget
pub const MAX_CORRECTION_ITERATIONS: usize = 64;

/// One band of the cascade
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandSettings {
    /// Filter design
    pub kind: FilterKind,
    /// Nominal frequency in Hz
    pub frequency: f64,
    /// Quality factor
    #[serde(default = "default_q")]
    pub q: f64,
    /// Target linear gain factor
    #[serde(default = "default_gain")]
    pub gain: f64,
    /// Whether the band takes part in processing
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

impl BandSettings {
    /// Create an enabled band
    pub fn new(kind: FilterKind, frequency: f64, q: f64, gain: f64) -> Self {
        Self {
            kind,
            frequency,
            q,
            gain,
            enabled: true,
        }
    }

    /// Low shelf band
    pub fn low_shelf(frequency: f64, q: f64, gain: f64) -> Self {
        Self::new(FilterKind::LowShelf, frequency, q, gain)
    }

    /// Peaking band
    pub fn peak(frequency: f64, q: f64, gain: f64) -> Self {
        Self::new(FilterKind::Peak, frequency, q, gain)
    }

    /// High shelf band
    pub fn high_shelf(frequency: f64, q: f64, gain: f64) -> Self {
        Self::new(FilterKind::HighShelf, frequency, q, gain)
    }
}

/// Gain-correction loop parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CorrectionSettings {
    /// Number of correction iterations (clamped to `1..=MAX_CORRECTION_ITERATIONS`)
    #[serde(default = "default_iterations")]
    pub iterations: usize,
    /// Stop early once every solved scale factor is within this distance of 1
    #[serde(default)]
    pub tolerance: Option<f64>,
}

impl CorrectionSettings {
    /// Copy with the iteration count clamped and an unusable tolerance dropped
    pub fn sanitized(self) -> Self {
        Self {
            iterations: self.iterations.clamp(1, MAX_CORRECTION_ITERATIONS),
            tolerance: self.tolerance.filter(|t| t.is_finite() && *t >= 0.0),
        }
    }
}

impl Default for CorrectionSettings {
    fn default() -> Self {
        Self {
            iterations: CORRECTION_ITERATIONS,
            tolerance: None,
        }
    }
}

/// Full equalizer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    /// Bands in cascade order
    #[serde(default = "reverb_layout")]
    pub bands: Vec<BandSettings>,
    /// Correction loop parameters
    #[serde(default)]
    pub correction: CorrectionSettings,
}

impl Default for EqualizerSettings {
    fn default() -> Self {
        Self {
            bands: reverb_layout(),
            correction: CorrectionSettings::default(),
        }
    }
}

/// Default 4-band layout used on the reverb impulse response
///
/// Low shelf at 1 kHz, peaks at 2 and 3 kHz, high shelf at 4 kHz, all
/// with a linear gain of 2.
pub fn reverb_layout() -> Vec<BandSettings> {
    vec![
        BandSettings::low_shelf(1000.0, 0.71, 2.0),
        BandSettings::peak(2000.0, 4.0, 2.0),
        BandSettings::peak(3000.0, 4.0, 2.0),
        BandSettings::high_shelf(4000.0, 0.71, 2.0),
    ]
}

fn default_q() -> f64 {
    DEFAULT_Q
}

fn default_gain() -> f64 {
    DEFAULT_GAIN
}

fn default_enabled() -> bool {
    true
}

fn default_iterations() -> usize {
    CORRECTION_ITERATIONS
}

/// Biquad filter
///
/// A single second-order section with a shelving or peaking design.
/// Coefficients are always derived from (kind, frequency, Q, gain): every
/// setter validates its input first and rebuilds the coefficients before
/// returning, so a rejected value leaves the filter untouched.
use crate::error::{EqError, FilterParameter, Result};
use crate::units::amplitude_to_db;
use reverb_core::{AudioBuffer, AudioTask, SampleRate};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Highest usable frequency as a fraction of the sample rate (99% of Nyquist)
///
/// Designing exactly at Nyquist collapses the peaking section to 0/0 there,
/// so the last evaluation point and the frequency bound stay just below it.
pub const MAX_FREQUENCY_RATIO: f64 = 0.495;

/// Default nominal frequency in Hz
pub const DEFAULT_FREQUENCY: f64 = 1000.0;

/// Default quality factor
pub const DEFAULT_Q: f64 = 0.5;

/// Default linear gain factor (unity)
pub const DEFAULT_GAIN: f64 = 1.0;

/// Maximum representable frequency for a sample rate
pub fn max_frequency(sample_rate: SampleRate) -> f64 {
    f64::from(sample_rate.as_hz()) * MAX_FREQUENCY_RATIO
}

/// Filter design for one band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Low shelf - boosts/cuts below frequency, flat above
    LowShelf,
    /// High shelf - boosts/cuts above frequency, flat below
    HighShelf,
    /// Peaking - boosts/cuts around frequency with Q bandwidth
    #[default]
    Peak,
}

impl FilterKind {
    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Self::LowShelf => "Low Shelf",
            Self::HighShelf => "High Shelf",
            Self::Peak => "Peak",
        }
    }
}

/// Normalized biquad coefficients (`a0 == 1`)
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct Coefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl Coefficients {
    /// Pass-through section
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Design coefficients for a band
    ///
    /// `gain` is the linear amplitude factor reached on the shelf plateau or
    /// at the peak center.
    pub fn design(kind: FilterKind, sample_rate: f64, frequency: f64, q: f64, gain: f64) -> Self {
        match kind {
            FilterKind::LowShelf => Self::low_shelf(sample_rate, frequency, q, gain),
            FilterKind::HighShelf => Self::high_shelf(sample_rate, frequency, q, gain),
            FilterKind::Peak => Self::peak(sample_rate, frequency, q, gain),
        }
    }

    fn peak(sample_rate: f64, frequency: f64, q: f64, gain: f64) -> Self {
        let a = gain.sqrt();
        let omega = 2.0 * PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self::normalize(b0, b1, b2, a0, a1, a2)
    }

    fn low_shelf(sample_rate: f64, frequency: f64, q: f64, gain: f64) -> Self {
        let a = gain.sqrt();
        let omega = 2.0 * PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);
        let beta = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) - (a - 1.0) * cos_omega + beta);
        let b1 = 2.0 * a * ((a - 1.0) - (a + 1.0) * cos_omega);
        let b2 = a * ((a + 1.0) - (a - 1.0) * cos_omega - beta);
        let a0 = (a + 1.0) + (a - 1.0) * cos_omega + beta;
        let a1 = -2.0 * ((a - 1.0) + (a + 1.0) * cos_omega);
        let a2 = (a + 1.0) + (a - 1.0) * cos_omega - beta;

        Self::normalize(b0, b1, b2, a0, a1, a2)
    }

    fn high_shelf(sample_rate: f64, frequency: f64, q: f64, gain: f64) -> Self {
        let a = gain.sqrt();
        let omega = 2.0 * PI * frequency / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);
        let beta = 2.0 * a.sqrt() * alpha;

        let b0 = a * ((a + 1.0) + (a - 1.0) * cos_omega + beta);
        let b1 = -2.0 * a * ((a - 1.0) + (a + 1.0) * cos_omega);
        let b2 = a * ((a + 1.0) + (a - 1.0) * cos_omega - beta);
        let a0 = (a + 1.0) - (a - 1.0) * cos_omega + beta;
        let a1 = 2.0 * ((a - 1.0) - (a + 1.0) * cos_omega);
        let a2 = (a + 1.0) - (a - 1.0) * cos_omega - beta;

        Self::normalize(b0, b1, b2, a0, a1, a2)
    }

    fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Magnitude `|H(e^jω)|` at `frequency`
    ///
    /// Evaluates numerator and denominator as complex values directly instead
    /// of the expanded `|B|²/|A|²` form, which keeps precision at DC where the
    /// coefficient sums nearly cancel.
    pub fn magnitude(&self, frequency: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * frequency / sample_rate;
        let (sin_1, cos_1) = omega.sin_cos();
        let (sin_2, cos_2) = (2.0 * omega).sin_cos();

        let num_re = self.b0 + self.b1 * cos_1 + self.b2 * cos_2;
        let num_im = self.b1 * sin_1 + self.b2 * sin_2;
        let den_re = 1.0 + self.a1 * cos_1 + self.a2 * cos_2;
        let den_im = self.a1 * sin_1 + self.a2 * sin_2;

        let den = den_re.hypot(den_im);
        if den > 0.0 {
            num_re.hypot(num_im) / den
        } else {
            0.0
        }
    }
}

impl Default for Coefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Second-order filter section for one equalizer band
///
/// Processes a single reference channel. Parameters are `f64`; the signal
/// path runs on `f32` samples with `f64` state.
#[derive(Debug, Clone)]
pub struct BiquadFilter {
    kind: FilterKind,
    frequency: f64,
    q: f64,
    gain: f64,
    enabled: bool,

    sample_rate: SampleRate,
    max_frequency: f64,
    coefficients: Coefficients,

    // Direct Form I state
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadFilter {
    /// Create a filter with the default parameter set
    ///
    /// The default frequency is lowered to the maximum frequency when the
    /// sample rate is too low to host it.
    pub fn new(kind: FilterKind, sample_rate: SampleRate) -> Result<Self> {
        if sample_rate.as_hz() == 0 {
            return Err(EqError::InvalidSampleRate(sample_rate.as_hz()));
        }

        let max_frequency = max_frequency(sample_rate);
        let mut filter = Self {
            kind,
            frequency: DEFAULT_FREQUENCY.min(max_frequency),
            q: DEFAULT_Q,
            gain: DEFAULT_GAIN,
            enabled: true,
            sample_rate,
            max_frequency,
            coefficients: Coefficients::IDENTITY,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };
        filter.rebuild();
        Ok(filter)
    }

    /// Create a filter and apply the given parameters
    pub fn with_params(
        kind: FilterKind,
        sample_rate: SampleRate,
        frequency: f64,
        q: f64,
        gain: f64,
    ) -> Result<Self> {
        let mut filter = Self::new(kind, sample_rate)?;
        filter.set_frequency(frequency)?;
        filter.set_q(q)?;
        filter.set_gain(gain)?;
        Ok(filter)
    }

    /// Filter design
    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    /// Nominal frequency in Hz
    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Quality factor
    pub fn q(&self) -> f64 {
        self.q
    }

    /// Linear gain factor currently designed into the coefficients
    pub fn gain(&self) -> f64 {
        self.gain
    }

    /// Sample rate the coefficients are designed for
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Upper bound for [`set_frequency`](Self::set_frequency)
    pub fn max_frequency(&self) -> f64 {
        self.max_frequency
    }

    /// Current coefficients
    pub fn coefficients(&self) -> Coefficients {
        self.coefficients
    }

    /// Whether the filter takes part in processing
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or bypass the filter
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Set the nominal frequency, `0 < frequency <= max_frequency`
    pub fn set_frequency(&mut self, frequency: f64) -> Result<()> {
        if !(frequency.is_finite() && frequency > 0.0 && frequency <= self.max_frequency) {
            return Err(EqError::out_of_range(FilterParameter::Frequency, frequency));
        }
        self.frequency = frequency;
        self.rebuild();
        Ok(())
    }

    /// Set the quality factor, `q > 0`
    pub fn set_q(&mut self, q: f64) -> Result<()> {
        if !(q.is_finite() && q > 0.0) {
            return Err(EqError::out_of_range(FilterParameter::Q, q));
        }
        self.q = q;
        self.rebuild();
        Ok(())
    }

    /// Set the linear gain factor, `gain > 0`
    ///
    /// Zero would mean infinite attenuation in decibels.
    pub fn set_gain(&mut self, gain: f64) -> Result<()> {
        if !(gain.is_finite() && gain > 0.0) {
            return Err(EqError::out_of_range(FilterParameter::Gain, gain));
        }
        self.gain = gain;
        self.rebuild();
        Ok(())
    }

    /// Write a gain the caller has already validated (correction loop)
    pub(crate) fn apply_gain(&mut self, gain: f64) {
        debug_assert!(gain.is_finite() && gain > 0.0, "gain must be positive: {}", gain);
        self.gain = gain;
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.coefficients = Coefficients::design(
            self.kind,
            f64::from(self.sample_rate.as_hz()),
            self.frequency,
            self.q,
            self.gain,
        );
    }

    /// Magnitude response at `frequency` in amplitude decibels
    ///
    /// Closed-form evaluation of the transfer function; no samples are run.
    /// Finite for every frequency in `[0, max_frequency]`. A bypassed filter
    /// reports 0 dB.
    pub fn db_amplitude(&self, frequency: f64) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        amplitude_to_db(
            self.coefficients
                .magnitude(frequency, f64::from(self.sample_rate.as_hz())),
        )
    }

    /// Process one sample
    #[inline]
    pub fn process_sample(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let c = &self.coefficients;
        let mut y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        // Flush denormals
        if y.abs() < 1e-30 {
            y = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y as f32
    }

    /// Filter a mono slice in place; a bypassed filter leaves it untouched
    pub fn process(&mut self, samples: &mut [f32]) {
        if !self.enabled {
            return;
        }
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Clear the delay line (coefficients are kept)
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }
}

impl AudioTask for BiquadFilter {
    type Error = EqError;

    fn exec(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        if !buffer.is_mono() {
            return Err(EqError::ChannelCount(buffer.channels()));
        }
        self.process(&mut buffer.samples);
        Ok(())
    }

    fn reset(&mut self) {
        BiquadFilter::reset(self);
    }

    fn name(&self) -> &str {
        self.kind.name()
    }
}

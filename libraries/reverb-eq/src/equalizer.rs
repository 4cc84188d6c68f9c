/// Gain-corrected filter cascade
///
/// Stacked shelf and peak sections overlap: at one band's nominal frequency
/// the neighbouring bands still contribute, so setting every section to its
/// requested gain overshoots the combined response. Before processing, the
/// cascade re-solves the per-band gains so that the summed decibel response
/// at each evaluation frequency matches what each band was asked for.
///
/// # Correction pass
///
/// With `dim` bands:
/// 1. Restore every band to its target gain and build the evaluation
///    frequencies: DC, the nominal frequency of each interior band, and the
///    maximum frequency.
/// 2. `gamma[i]` = response of band `i` alone at evaluation frequency `i`.
/// 3. Set every band to the +1 dB probe gain.
/// 4. Repeat: fill `B[i][j]` = response of band `j` at evaluation frequency
///    `i`, solve `B · x = gamma`, and rescale each band's gain to
///    `db_to_linear(x[i] · linear_to_db(gain))`.
///
/// All scratch storage is sized at construction, so a pass never allocates.
use crate::error::{EqError, Result};
use crate::filter::{max_frequency, BiquadFilter, FilterKind};
use crate::settings::{BandSettings, CorrectionSettings, EqualizerSettings};
use crate::solver::LinearSystem;
use crate::units::{db_to_linear, linear_to_db};
use reverb_core::{AudioBuffer, AudioTask, SampleRate};
use tracing::{debug, error, trace};

/// Maximum number of bands in one cascade
pub const MAX_BANDS: usize = 8;

/// Probe gain applied before the first correction iteration, in dB
pub const PROBE_GAIN_DB: f64 = 1.0;

/// Targets closer than this to 0 dB are treated as flat
///
/// A flat band has an all-zero response column, which would make the
/// correction system singular; such bands are held out of the solve.
pub const FLAT_GAIN_DB: f64 = 1e-6;

/// Low shelf band of the default reverb layout
pub const LOW: usize = 0;
/// First peaking band of the default reverb layout
pub const PEAK1: usize = 1;
/// Second peaking band of the default reverb layout
pub const PEAK2: usize = 2;
/// High shelf band of the default reverb layout
pub const HIGH: usize = 3;

/// Multi-band shelving/peaking equalizer with inter-band gain correction
#[derive(Debug, Clone)]
pub struct Equalizer {
    /// Bands in cascade order (band index = position)
    filters: Vec<BiquadFilter>,

    /// Gains requested per band, distinct from the corrected filter gains
    target_gains: Vec<f64>,

    // Correction scratch, sized to the band count at construction
    eval_frequencies: Vec<f64>,
    active: Vec<bool>,
    gamma: Vec<f64>,
    lambda: Vec<f64>,
    system: LinearSystem,

    correction: CorrectionSettings,
    sample_rate: SampleRate,
    max_frequency: f64,

    /// Whether the equalizer is enabled
    enabled: bool,

    /// Flag to rerun the correction before the next processing pass
    needs_update: bool,
}

impl Equalizer {
    /// Create an equalizer with the default reverb layout
    ///
    /// Bands: low shelf 1 kHz, peaks at 2 and 3 kHz, high shelf 4 kHz
    /// (see [`crate::settings::reverb_layout`]).
    pub fn new(sample_rate: SampleRate) -> Result<Self> {
        Self::from_settings(&EqualizerSettings::default(), sample_rate)
    }

    /// Create an equalizer with one default-parameter band per kind
    ///
    /// # Errors
    /// `EqError::BandCount` unless `1 <= kinds.len() <= MAX_BANDS`,
    /// `EqError::InvalidSampleRate` for a 0 Hz sample rate.
    pub fn with_kinds(kinds: &[FilterKind], sample_rate: SampleRate) -> Result<Self> {
        let dim = kinds.len();
        if dim == 0 || dim > MAX_BANDS {
            return Err(EqError::BandCount(dim));
        }

        let filters = kinds
            .iter()
            .map(|&kind| BiquadFilter::new(kind, sample_rate))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            target_gains: filters.iter().map(BiquadFilter::gain).collect(),
            filters,
            eval_frequencies: vec![0.0; dim],
            active: vec![true; dim],
            gamma: vec![0.0; dim],
            lambda: vec![0.0; dim],
            system: LinearSystem::new(dim),
            correction: CorrectionSettings::default(),
            sample_rate,
            max_frequency: max_frequency(sample_rate),
            enabled: true,
            needs_update: true,
        })
    }

    /// Build an equalizer from serialized settings
    ///
    /// # Errors
    /// Any band value a setter would reject, plus the construction errors
    /// of [`with_kinds`](Self::with_kinds).
    pub fn from_settings(settings: &EqualizerSettings, sample_rate: SampleRate) -> Result<Self> {
        let kinds: Vec<FilterKind> = settings.bands.iter().map(|band| band.kind).collect();
        let mut eq = Self::with_kinds(&kinds, sample_rate)?;

        for (index, band) in settings.bands.iter().enumerate() {
            eq.set_filter_frequency(index, band.frequency)?;
            eq.set_filter_q(index, band.q)?;
            eq.set_filter_gain(index, band.gain)?;
            eq.set_filter_enabled(index, band.enabled)?;
        }
        eq.set_correction(settings.correction);

        Ok(eq)
    }

    /// Snapshot of the requested (uncorrected) configuration
    pub fn settings(&self) -> EqualizerSettings {
        let bands = self
            .filters
            .iter()
            .zip(&self.target_gains)
            .map(|(filter, &gain)| BandSettings {
                kind: filter.kind(),
                frequency: filter.frequency(),
                q: filter.q(),
                gain,
                enabled: filter.is_enabled(),
            })
            .collect();

        EqualizerSettings {
            bands,
            correction: self.correction,
        }
    }

    /// Number of bands (fixed after construction)
    pub fn num_filters(&self) -> usize {
        self.filters.len()
    }

    /// Sample rate shared by all bands
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Maximum representable frequency, also the last evaluation frequency
    pub fn max_frequency(&self) -> f64 {
        self.max_frequency
    }

    /// Correction loop parameters
    pub fn correction(&self) -> CorrectionSettings {
        self.correction
    }

    /// Replace the correction loop parameters (sanitized)
    pub fn set_correction(&mut self, correction: CorrectionSettings) {
        self.correction = correction.sanitized();
        self.needs_update = true;
    }

    /// Whether a parameter changed since the last successful correction
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Evaluation frequencies of the most recent correction pass
    pub fn evaluation_frequencies(&self) -> &[f64] {
        &self.eval_frequencies
    }

    fn check_band(&self, band: usize) -> Result<()> {
        if band < self.filters.len() {
            Ok(())
        } else {
            Err(EqError::InvalidFilter {
                index: band,
                count: self.filters.len(),
            })
        }
    }

    /// Borrow one band's filter
    pub fn filter(&self, band: usize) -> Result<&BiquadFilter> {
        self.check_band(band)?;
        Ok(&self.filters[band])
    }

    /// Set a band's nominal frequency
    pub fn set_filter_frequency(&mut self, band: usize, frequency: f64) -> Result<()> {
        self.check_band(band)?;
        self.filters[band].set_frequency(frequency)?;
        self.needs_update = true;
        Ok(())
    }

    /// Set a band's Q
    pub fn set_filter_q(&mut self, band: usize, q: f64) -> Result<()> {
        self.check_band(band)?;
        self.filters[band].set_q(q)?;
        self.needs_update = true;
        Ok(())
    }

    /// Set a band's gain
    ///
    /// Stores `gain` as the band's target and writes it into the filter;
    /// the next correction pass replaces the filter gain with a corrected
    /// value while [`target_gain`](Self::target_gain) keeps reporting `gain`.
    pub fn set_filter_gain(&mut self, band: usize, gain: f64) -> Result<()> {
        self.check_band(band)?;
        self.filters[band].set_gain(gain)?;
        self.target_gains[band] = gain;
        self.needs_update = true;
        Ok(())
    }

    /// Enable or bypass a band
    pub fn set_filter_enabled(&mut self, band: usize, enabled: bool) -> Result<()> {
        self.check_band(band)?;
        self.filters[band].set_enabled(enabled);
        self.needs_update = true;
        Ok(())
    }

    /// A band's nominal frequency in Hz
    pub fn filter_frequency(&self, band: usize) -> Result<f64> {
        Ok(self.filter(band)?.frequency())
    }

    /// A band's Q
    pub fn filter_q(&self, band: usize) -> Result<f64> {
        Ok(self.filter(band)?.q())
    }

    /// A band's current filter gain (corrected after a correction pass)
    pub fn filter_gain(&self, band: usize) -> Result<f64> {
        Ok(self.filter(band)?.gain())
    }

    /// The gain last requested for a band
    pub fn target_gain(&self, band: usize) -> Result<f64> {
        self.check_band(band)?;
        Ok(self.target_gains[band])
    }

    /// Whether a band takes part in processing
    pub fn is_filter_enabled(&self, band: usize) -> Result<bool> {
        Ok(self.filter(band)?.is_enabled())
    }

    /// Combined response at `frequency` in dB
    ///
    /// Series stages multiply in magnitude, so their decibel responses add.
    pub fn db_amplitude(&self, frequency: f64) -> f64 {
        self.filters
            .iter()
            .map(|filter| filter.db_amplitude(frequency))
            .sum()
    }

    /// Fill `out` with the combined response at each of `frequencies`
    ///
    /// Only `min(frequencies.len(), out.len())` entries are written.
    pub fn response_curve(&self, frequencies: &[f64], out: &mut [f64]) {
        for (value, &frequency) in out.iter_mut().zip(frequencies) {
            *value = self.db_amplitude(frequency);
        }
    }

    fn fill_evaluation_frequencies(&mut self) {
        let dim = self.filters.len();

        // A lone band is evaluated at its own nominal frequency
        if dim == 1 {
            self.eval_frequencies[0] = self.filters[0].frequency();
            return;
        }

        self.eval_frequencies[0] = 0.0;
        for (slot, filter) in self.eval_frequencies[1..dim - 1]
            .iter_mut()
            .zip(&self.filters[1..dim - 1])
        {
            *slot = filter.frequency();
        }
        self.eval_frequencies[dim - 1] = self.max_frequency;
    }

    /// Run a full gain-correction pass
    ///
    /// Always starts from the target gains, so repeated calls without
    /// parameter changes give the same corrected gains.
    ///
    /// # Errors
    /// `EqError::SingularSystem` if a solve finds no usable pivot or a
    /// corrected gain leaves the positive finite range. The pass is aborted,
    /// [`needs_update`](Self::needs_update) stays set and the correction is
    /// retried on the next call.
    pub fn update_filters(&mut self) -> Result<()> {
        for (filter, &target) in self.filters.iter_mut().zip(&self.target_gains) {
            filter.apply_gain(target);
        }

        self.fill_evaluation_frequencies();

        for ((active, filter), &target) in self
            .active
            .iter_mut()
            .zip(&self.filters)
            .zip(&self.target_gains)
        {
            *active = filter.is_enabled() && linear_to_db(target).abs() >= FLAT_GAIN_DB;
        }

        for (((gamma, filter), &active), &frequency) in self
            .gamma
            .iter_mut()
            .zip(&self.filters)
            .zip(&self.active)
            .zip(&self.eval_frequencies)
        {
            *gamma = if active {
                filter.db_amplitude(frequency)
            } else {
                0.0
            };
        }

        let probe = db_to_linear(PROBE_GAIN_DB);
        for (filter, &active) in self.filters.iter_mut().zip(&self.active) {
            if active {
                filter.apply_gain(probe);
            }
        }

        for iteration in 0..self.correction.iterations {
            self.lambda.copy_from_slice(&self.gamma);

            for (row, (&frequency, &active)) in self
                .eval_frequencies
                .iter()
                .zip(&self.active)
                .enumerate()
            {
                let values = self.system.row_mut(row);
                if active {
                    for (value, filter) in values.iter_mut().zip(&self.filters) {
                        *value = filter.db_amplitude(frequency);
                    }
                } else {
                    // Held-out band: x[row] = 0, no coupling into the other rows
                    values.fill(0.0);
                    values[row] = 1.0;
                }
            }

            if let Err(err) = self.system.solve(&mut self.lambda) {
                error!(iteration, error = %err, "gain correction aborted");
                return Err(err);
            }

            // Check the whole gain set before writing any of it back
            let mut max_step: f64 = 0.0;
            for (band, ((scale, filter), &active)) in self
                .lambda
                .iter_mut()
                .zip(&self.filters)
                .zip(&self.active)
                .enumerate()
            {
                if !active {
                    continue;
                }
                let corrected = db_to_linear(*scale * linear_to_db(filter.gain()));
                if !corrected.is_finite() || corrected <= 0.0 {
                    error!(iteration, band, scale = *scale, "gain correction diverged");
                    return Err(EqError::SingularSystem { column: band });
                }
                max_step = max_step.max((*scale - 1.0).abs());
                *scale = corrected;
            }

            for ((filter, &corrected), &active) in
                self.filters.iter_mut().zip(&self.lambda).zip(&self.active)
            {
                if active {
                    filter.apply_gain(corrected);
                }
            }

            trace!(iteration, max_step, "correction iteration");

            if let Some(tolerance) = self.correction.tolerance {
                if max_step <= tolerance {
                    debug!(iterations = iteration + 1, "gain correction converged early");
                    break;
                }
            }
        }

        for (band, (filter, &target)) in self.filters.iter().zip(&self.target_gains).enumerate() {
            debug!(band, target, corrected = filter.gain(), "corrected band gain");
        }

        self.needs_update = false;
        Ok(())
    }

    /// Enable or bypass the whole cascade
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Check if the cascade is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Correct gains if a parameter changed, then run every band in order
    /// over a mono slice
    ///
    /// # Errors
    /// Propagates a failed correction; `samples` is untouched in that case.
    pub fn process(&mut self, samples: &mut [f32]) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.needs_update {
            self.update_filters()?;
        }

        for filter in &mut self.filters {
            filter.process(samples);
        }
        Ok(())
    }
}

impl AudioTask for Equalizer {
    type Error = EqError;

    fn exec(&mut self, buffer: &mut AudioBuffer) -> Result<()> {
        if !buffer.is_mono() {
            return Err(EqError::ChannelCount(buffer.channels()));
        }
        self.process(&mut buffer.samples)
    }

    fn reset(&mut self) {
        for filter in &mut self.filters {
            filter.reset();
        }
    }

    fn name(&self) -> &str {
        "Equalizer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{DEFAULT_FREQUENCY, DEFAULT_GAIN, DEFAULT_Q};
    use crate::settings::CORRECTION_ITERATIONS;

    const SR: SampleRate = SampleRate::DVD_QUALITY;

    #[test]
    fn create_default_layout() {
        let eq = Equalizer::new(SR).unwrap();
        assert_eq!(eq.num_filters(), 4);
        assert!(eq.is_enabled());
        assert!(eq.needs_update());
        assert_eq!(eq.name(), "Equalizer");

        assert_eq!(eq.filter(LOW).unwrap().kind(), FilterKind::LowShelf);
        assert_eq!(eq.filter(PEAK1).unwrap().kind(), FilterKind::Peak);
        assert_eq!(eq.filter(PEAK2).unwrap().kind(), FilterKind::Peak);
        assert_eq!(eq.filter(HIGH).unwrap().kind(), FilterKind::HighShelf);

        assert_eq!(eq.filter_frequency(PEAK2).unwrap(), 3000.0);
        assert_eq!(eq.filter_q(HIGH).unwrap(), 0.71);
        assert_eq!(eq.target_gain(LOW).unwrap(), 2.0);
        assert_eq!(eq.correction().iterations, CORRECTION_ITERATIONS);
    }

    #[test]
    fn diverging_iteration_writes_no_gains() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.set_filter_frequency(PEAK1, 500.0).unwrap();
        eq.set_filter_frequency(PEAK2, 1000.0).unwrap();
        eq.set_filter_q(PEAK1, 0.05).unwrap();
        eq.set_filter_q(PEAK2, 0.05).unwrap();
        for (band, gain) in [0.01, 100.0, 0.01, 2.0].into_iter().enumerate() {
            eq.set_filter_gain(band, gain).unwrap();
        }

        // The first solve asks band 1 for thousands of times its probe gain in dB
        let err = eq.update_filters().unwrap_err();
        assert_eq!(err, EqError::SingularSystem { column: PEAK1 });

        let probe = db_to_linear(PROBE_GAIN_DB);
        for band in 0..eq.num_filters() {
            assert_eq!(eq.filter_gain(band).unwrap(), probe, "band {}", band);
        }
        assert!(eq.needs_update());
    }

    #[test]
    fn with_kinds_uses_filter_defaults() {
        let eq = Equalizer::with_kinds(&[FilterKind::Peak, FilterKind::Peak], SR).unwrap();
        assert_eq!(eq.filter_frequency(1).unwrap(), DEFAULT_FREQUENCY);
        assert_eq!(eq.filter_q(1).unwrap(), DEFAULT_Q);
        assert_eq!(eq.target_gain(1).unwrap(), DEFAULT_GAIN);
    }

    #[test]
    fn band_count_bounds() {
        assert_eq!(
            Equalizer::with_kinds(&[], SR).unwrap_err(),
            EqError::BandCount(0)
        );
        let too_many = [FilterKind::Peak; MAX_BANDS + 1];
        assert_eq!(
            Equalizer::with_kinds(&too_many, SR).unwrap_err(),
            EqError::BandCount(MAX_BANDS + 1)
        );
        assert!(Equalizer::with_kinds(&[FilterKind::Peak; MAX_BANDS], SR).is_ok());
    }

    #[test]
    fn invalid_sample_rate() {
        assert_eq!(
            Equalizer::new(SampleRate::new(0)).unwrap_err(),
            EqError::InvalidSampleRate(0)
        );
    }

    #[test]
    fn evaluation_frequencies_layout() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.update_filters().unwrap();
        assert_eq!(
            eq.evaluation_frequencies(),
            &[0.0, 2000.0, 3000.0, eq.max_frequency()]
        );
    }

    #[test]
    fn single_band_evaluated_at_own_frequency() {
        let mut eq = Equalizer::with_kinds(&[FilterKind::Peak], SR).unwrap();
        eq.set_filter_frequency(0, 1500.0).unwrap();
        eq.set_filter_gain(0, 2.0).unwrap();
        eq.update_filters().unwrap();
        assert_eq!(eq.evaluation_frequencies(), &[1500.0]);
    }

    #[test]
    fn target_gain_survives_correction() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.update_filters().unwrap();

        assert!(!eq.needs_update());
        assert_eq!(eq.target_gain(PEAK1).unwrap(), 2.0);
        // Overlap with the high shelf pulls the 3 kHz peak well below its target
        assert!(eq.filter_gain(PEAK2).unwrap() < 1.9);
    }

    #[test]
    fn parameter_change_marks_dirty() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.update_filters().unwrap();
        assert!(!eq.needs_update());

        eq.set_filter_q(PEAK1, 2.0).unwrap();
        assert!(eq.needs_update());
    }

    #[test]
    fn rejected_parameter_keeps_clean_state() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.update_filters().unwrap();

        assert!(eq.set_filter_frequency(PEAK1, -5.0).is_err());
        assert!(!eq.needs_update());
    }

    #[test]
    fn flat_band_is_held_out() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.set_filter_gain(PEAK1, 1.0).unwrap();
        eq.update_filters().unwrap();

        assert_eq!(eq.filter_gain(PEAK1).unwrap(), 1.0);
        let response = eq.db_amplitude(3000.0);
        assert!((response - 20.0 * 2.0_f64.log10()).abs() < 1e-6);
    }

    #[test]
    fn disabled_band_is_held_out() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.set_filter_enabled(PEAK2, false).unwrap();
        eq.update_filters().unwrap();

        assert!(!eq.is_filter_enabled(PEAK2).unwrap());
        assert_eq!(eq.filter_gain(PEAK2).unwrap(), 2.0);
        assert_eq!(eq.filter(PEAK2).unwrap().db_amplitude(3000.0), 0.0);
        let response = eq.db_amplitude(2000.0);
        assert!((response - 20.0 * 2.0_f64.log10()).abs() < 1e-6);
    }

    #[test]
    fn tolerance_exits_early_with_same_result() {
        let mut fixed = Equalizer::new(SR).unwrap();
        fixed.update_filters().unwrap();

        let mut early = Equalizer::new(SR).unwrap();
        early.set_correction(CorrectionSettings {
            iterations: 50,
            tolerance: Some(1e-9),
        });
        early.update_filters().unwrap();

        for band in 0..4 {
            let a = fixed.filter_gain(band).unwrap();
            let b = early.filter_gain(band).unwrap();
            assert!((a - b).abs() < 1e-6, "band {}: {} vs {}", band, a, b);
        }
    }

    #[test]
    fn process_runs_correction_once() {
        let mut eq = Equalizer::new(SR).unwrap();
        let mut samples = vec![0.0_f32; 32];
        samples[0] = 1.0;

        eq.process(&mut samples).unwrap();
        assert!(!eq.needs_update());
        assert!(samples.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn disabled_equalizer_is_bypassed() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.set_enabled(false);

        let mut samples = vec![0.5_f32; 64];
        eq.process(&mut samples).unwrap();
        assert_eq!(samples, vec![0.5_f32; 64]);
        assert!(eq.needs_update());
    }

    #[test]
    fn settings_snapshot_reports_targets() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.set_filter_gain(HIGH, 0.5).unwrap();
        eq.update_filters().unwrap();

        let settings = eq.settings();
        assert_eq!(settings.bands[HIGH].gain, 0.5);
        assert_eq!(settings.bands[PEAK1].gain, 2.0);

        let rebuilt = Equalizer::from_settings(&settings, SR).unwrap();
        assert_eq!(rebuilt.settings(), settings);
    }

    #[test]
    fn response_curve_matches_point_queries() {
        let mut eq = Equalizer::new(SR).unwrap();
        eq.update_filters().unwrap();

        let frequencies = [100.0, 1000.0, 2000.0, 10_000.0];
        let mut curve = [0.0; 4];
        eq.response_curve(&frequencies, &mut curve);
        for (value, &frequency) in curve.iter().zip(&frequencies) {
            assert_eq!(*value, eq.db_amplitude(frequency));
        }
    }
}

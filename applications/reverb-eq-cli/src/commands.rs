/// Subcommand implementations
///
/// Each command returns plain data; `main` decides how to print it.
use crate::config::CliConfig;
use crate::error::Result;
use crate::wav;
use reverb_core::{AudioTask, SampleRate};
use reverb_eq::units::log_spaced_frequencies;
use reverb_eq::FilterKind;
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Lowest frequency of the printed response grid
pub const RESPONSE_MIN_FREQUENCY: f64 = 20.0;

/// Result of equalizing one impulse response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplyReport {
    pub sample_rate: u32,
    pub channel: u16,
    pub frames: usize,
    pub bands: Vec<BandGain>,
}

/// One point of the corrected cascade response
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponsePoint {
    pub frequency: f64,
    pub db: f64,
}

/// Requested vs corrected gain of one band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandGain {
    pub band: usize,
    pub kind: FilterKind,
    pub frequency: f64,
    pub q: f64,
    pub target: f64,
    pub corrected: f64,
    pub enabled: bool,
}

fn band_gains(eq: &reverb_eq::Equalizer) -> Result<Vec<BandGain>> {
    (0..eq.num_filters())
        .map(|band| -> Result<BandGain> {
            let filter = eq.filter(band)?;
            Ok(BandGain {
                band,
                kind: filter.kind(),
                frequency: filter.frequency(),
                q: filter.q(),
                target: eq.target_gain(band)?,
                corrected: filter.gain(),
                enabled: filter.is_enabled(),
            })
        })
        .collect()
}

/// Equalize reference channel `channel` of `input` and write it to `output`
pub fn apply(input: &Path, output: &Path, channel: u16, config: &CliConfig) -> Result<ApplyReport> {
    let mut buffer = wav::read_channel(input, channel)?;
    let sample_rate = buffer.format.sample_rate;
    info!(
        input = %input.display(),
        channel,
        frames = buffer.frames(),
        sample_rate = sample_rate.as_hz(),
        "Loaded impulse response"
    );

    let mut eq = config.equalizer(sample_rate)?;
    eq.exec(&mut buffer)?;

    wav::write_mono(output, &buffer)?;
    info!(output = %output.display(), "Wrote equalized impulse response");

    Ok(ApplyReport {
        sample_rate: sample_rate.as_hz(),
        channel,
        frames: buffer.frames(),
        bands: band_gains(&eq)?,
    })
}

/// Corrected cascade response on a log grid from 20 Hz to the maximum frequency
pub fn response(config: &CliConfig, points: usize) -> Result<Vec<ResponsePoint>> {
    let mut eq = config.equalizer(SampleRate::new(config.sample_rate))?;
    eq.update_filters()?;

    let frequencies = log_spaced_frequencies(RESPONSE_MIN_FREQUENCY, eq.max_frequency(), points);
    let mut curve = vec![0.0; frequencies.len()];
    eq.response_curve(&frequencies, &mut curve);

    Ok(frequencies
        .into_iter()
        .zip(curve)
        .map(|(frequency, db)| ResponsePoint { frequency, db })
        .collect())
}

/// Target and corrected gain per band
pub fn gains(config: &CliConfig) -> Result<Vec<BandGain>> {
    let mut eq = config.equalizer(SampleRate::new(config.sample_rate))?;
    eq.update_filters()?;
    band_gains(&eq)
}

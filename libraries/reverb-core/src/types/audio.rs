/// Audio-related types
use crate::error::{ReverbError, Result};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// Common sample rates
    pub const CD_QUALITY: Self = Self(44_100);
    pub const DVD_QUALITY: Self = Self(48_000);
    pub const HIGH_RES_96: Self = Self(96_000);
    pub const HIGH_RES_192: Self = Self(192_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }

    /// Nyquist frequency in Hz
    pub fn nyquist(&self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl Default for SampleRate {
    fn default() -> Self {
        Self::DVD_QUALITY
    }
}

/// Audio format information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate
    pub sample_rate: SampleRate,

    /// Number of channels (1 = mono, 2 = stereo, etc.)
    pub channels: u16,

    /// Bits per sample
    pub bits_per_sample: u16,
}

impl AudioFormat {
    /// Create a new audio format
    pub fn new(sample_rate: SampleRate, channels: u16, bits_per_sample: u16) -> Self {
        Self {
            sample_rate,
            channels,
            bits_per_sample,
        }
    }

    /// Single-channel 32-bit float format
    pub fn mono(sample_rate: SampleRate) -> Self {
        Self::new(sample_rate, 1, 32)
    }
}

/// Audio buffer containing samples
///
/// Samples are stored as f32 in the range [-1.0, 1.0]
/// Interleaved format: [L, R, L, R, ...] for stereo
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Audio samples (f32, interleaved)
    pub samples: Vec<f32>,

    /// Audio format information
    pub format: AudioFormat,
}

impl AudioBuffer {
    /// Create a new audio buffer
    pub fn new(samples: Vec<f32>, format: AudioFormat) -> Self {
        Self { samples, format }
    }

    /// Create a single-channel buffer
    pub fn mono(samples: Vec<f32>, sample_rate: SampleRate) -> Self {
        Self::new(samples, AudioFormat::mono(sample_rate))
    }

    /// Number of interleaved channels
    pub fn channels(&self) -> u16 {
        self.format.channels
    }

    /// Whether the buffer holds exactly one channel
    pub fn is_mono(&self) -> bool {
        self.format.channels == 1
    }

    /// Get the number of frames (samples per channel)
    pub fn frames(&self) -> usize {
        match self.format.channels {
            0 => 0,
            channels => self.samples.len() / channels as usize,
        }
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        match self.format.sample_rate.as_hz() {
            0 => 0.0,
            hz => self.frames() as f64 / f64::from(hz),
        }
    }

    /// Check if the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Get the length in samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Copy one channel out of an interleaved buffer into a mono buffer
    ///
    /// # Errors
    /// Returns `ReverbError::InvalidInput` if `index` is not a channel of this buffer.
    pub fn channel(&self, index: u16) -> Result<AudioBuffer> {
        let channels = self.format.channels;
        if index >= channels {
            return Err(ReverbError::invalid_input(format!(
                "channel {} out of range for {}-channel buffer",
                index, channels
            )));
        }

        let samples = self
            .samples
            .iter()
            .skip(index as usize)
            .step_by(channels as usize)
            .copied()
            .collect();

        Ok(AudioBuffer::new(
            samples,
            AudioFormat::new(self.format.sample_rate, 1, self.format.bits_per_sample),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_rate_common_values() {
        assert_eq!(SampleRate::CD_QUALITY.as_hz(), 44_100);
        assert_eq!(SampleRate::DVD_QUALITY.as_hz(), 48_000);
        assert_eq!(SampleRate::DVD_QUALITY.nyquist(), 24_000.0);
    }

    #[test]
    fn audio_buffer_frames_calculation() {
        let format = AudioFormat::new(SampleRate::CD_QUALITY, 2, 16);
        // 8 samples with 2 channels = 4 frames
        let buffer = AudioBuffer::new(vec![0.0; 8], format);
        assert_eq!(buffer.frames(), 4);
        assert!(!buffer.is_mono());
    }

    #[test]
    fn zero_channel_buffer_has_no_frames() {
        let format = AudioFormat::new(SampleRate::CD_QUALITY, 0, 16);
        let buffer = AudioBuffer::new(vec![0.0; 8], format);
        assert_eq!(buffer.frames(), 0);
        assert_eq!(buffer.duration_secs(), 0.0);
    }

    #[test]
    fn audio_buffer_duration() {
        let buffer = AudioBuffer::mono(vec![0.0; 44_100], SampleRate::CD_QUALITY);
        assert!((buffer.duration_secs() - 1.0).abs() < 0.01);
    }

    #[test]
    fn extract_channel_from_interleaved() {
        let format = AudioFormat::new(SampleRate::DVD_QUALITY, 2, 24);
        let buffer = AudioBuffer::new(vec![0.1, -0.1, 0.2, -0.2, 0.3, -0.3], format);

        let right = buffer.channel(1).unwrap();
        assert!(right.is_mono());
        assert_eq!(right.samples, vec![-0.1, -0.2, -0.3]);
        assert_eq!(right.format.bits_per_sample, 24);
        assert_eq!(right.format.sample_rate, SampleRate::DVD_QUALITY);
    }

    #[test]
    fn extract_missing_channel_fails() {
        let buffer = AudioBuffer::mono(vec![0.0; 4], SampleRate::DVD_QUALITY);
        let err = buffer.channel(1).unwrap_err();
        assert!(matches!(err, ReverbError::InvalidInput(_)));
    }

    #[test]
    fn format_serializes() {
        let format = AudioFormat::mono(SampleRate::HIGH_RES_96);
        let json = serde_json::to_string(&format).unwrap();
        let back: AudioFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(back, format);
    }
}

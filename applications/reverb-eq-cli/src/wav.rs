/// WAV file I/O for impulse responses
use crate::error::{CliError, Result};
use reverb_core::{AudioBuffer, AudioFormat, ReverbError, SampleRate};
use std::path::Path;

/// Read a WAV file into an interleaved buffer, samples scaled to [-1.0, 1.0]
pub fn read_wav(path: &Path) -> Result<AudioBuffer> {
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = 2.0_f32.powi(i32::from(spec.bits_per_sample) - 1);
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|s| s as f32 / max_val))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    if samples.is_empty() {
        return Err(ReverbError::invalid_input(format!(
            "Impulse response is empty: {}",
            path.display()
        ))
        .into());
    }

    let format = AudioFormat::new(
        SampleRate::new(spec.sample_rate),
        spec.channels,
        spec.bits_per_sample,
    );
    Ok(AudioBuffer::new(samples, format))
}

/// Read one reference channel of a WAV file as a mono buffer
pub fn read_channel(path: &Path, channel: u16) -> Result<AudioBuffer> {
    Ok(read_wav(path)?.channel(channel)?)
}

/// Write a mono buffer as 32-bit float WAV
pub fn write_mono(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: buffer.format.sample_rate.as_hz(),
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in &buffer.samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_stereo_i16(path: &Path) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..8_i16 {
            writer.write_sample(i * 1024).unwrap();
            writer.write_sample(-i * 1024).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn reads_int_wav_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_stereo_i16(&path);

        let buffer = read_wav(&path).unwrap();
        assert_eq!(buffer.channels(), 2);
        assert_eq!(buffer.frames(), 8);
        assert_eq!(buffer.format.sample_rate, SampleRate::CD_QUALITY);
        assert_eq!(buffer.samples[2], 1024.0 / 32768.0);
        assert_eq!(buffer.samples[3], -1024.0 / 32768.0);
    }

    #[test]
    fn extracts_reference_channel() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_stereo_i16(&path);

        let right = read_channel(&path, 1).unwrap();
        assert!(right.is_mono());
        assert_eq!(right.len(), 8);
        assert_eq!(right.samples[1], -1024.0 / 32768.0);

        assert!(matches!(read_channel(&path, 2), Err(CliError::Core(_))));
    }

    #[test]
    fn float_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        let buffer = AudioBuffer::mono(vec![0.5, -0.25, 0.125], SampleRate::DVD_QUALITY);

        write_mono(&path, &buffer).unwrap();
        let back = read_channel(&path, 0).unwrap();
        assert_eq!(back.samples, buffer.samples);
        assert_eq!(back.format.sample_rate, SampleRate::DVD_QUALITY);
    }

    #[test]
    fn empty_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        hound::WavWriter::create(&path, spec).unwrap().finalize().unwrap();

        let err = read_wav(&path).unwrap_err();
        assert!(matches!(
            err,
            CliError::Core(ReverbError::InvalidInput(_))
        ));
    }

    #[test]
    fn missing_file_is_wav_error() {
        let err = read_wav(Path::new("/nonexistent/ir.wav")).unwrap_err();
        assert!(matches!(err, CliError::Wav(_)));
    }
}

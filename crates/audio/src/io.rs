//! WAV decode/encode built on `hound`.

use std::path::Path;

use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::Waveform;

/// Loads a WAV file as a mono waveform, averaging channels if needed.
///
/// Integer and float sample formats are both accepted; samples are scaled
/// into `[-1.0, 1.0]`.
pub fn load_wav<P: AsRef<Path>>(path: P) -> Result<Waveform> {
    let path = path.as_ref();
    let reader = WavReader::open(path)
        .with_context(|| format!("failed to open WAV file {}", path.display()))?;

    let spec = reader.spec();
    let sample_rate = spec.sample_rate;
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to decode {}", path.display()))?,
        SampleFormat::Int => {
            let bits = spec.bits_per_sample;
            let max_val = (1i64 << (bits - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()
                .with_context(|| format!("failed to decode {}", path.display()))?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    Ok(Waveform::mono(mono, sample_rate))
}

/// Writes a waveform as 16-bit PCM, preserving its channel layout.
pub fn save_wav<P: AsRef<Path>>(path: P, wave: &Waveform) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: wave.channels() as u16,
        sample_rate: wave.sample_rate(),
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV file {}", path.display()))?;

    for &sample in wave.samples() {
        let scaled = (sample.clamp(-1.0, 1.0) * 32767.0) as i16;
        writer.write_sample(scaled)?;
    }

    writer
        .finalize()
        .with_context(|| format!("failed to finalize WAV file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn round_trip_preserves_rate_and_length() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let original = Waveform::mono(vec![0.1, 0.2, -0.3, 0.4, -0.5], 24_000);
        save_wav(&path, &original).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.sample_rate(), 24_000);
        assert_eq!(loaded.frames(), 5);
        for (a, b) in original.samples().iter().zip(loaded.samples()) {
            assert!((a - b).abs() < 1e-4, "sample mismatch: {a} vs {b}");
        }
    }

    #[test]
    fn stereo_file_downmixes_to_mono() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stereo.wav");

        let stereo = Waveform::new(vec![1.0, 0.0, 0.0, 1.0], 2, 16_000);
        save_wav(&path, &stereo).unwrap();

        let loaded = load_wav(&path).unwrap();
        assert_eq!(loaded.channels(), 1);
        assert_eq!(loaded.frames(), 2);
        for sample in loaded.samples() {
            assert!((sample - 0.5).abs() < 1e-3);
        }
    }

    #[test]
    fn stereo_waveform_writes_two_channels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("wide.wav");

        let wide = Waveform::new(vec![0.1, 0.2, 0.3, 0.4], 2, 44_100);
        save_wav(&path, &wide).unwrap();

        let spec = WavReader::open(&path).unwrap().spec();
        assert_eq!(spec.channels, 2);
        assert_eq!(spec.bits_per_sample, 16);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(load_wav("/nonexistent/clip.wav").is_err());
    }
}

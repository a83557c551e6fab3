//! Audio primitives shared across the Revo frontend.
//!
//! The crate provides an owned interleaved waveform buffer, WAV
//! decode/encode helpers, and the stereo widening transform applied to
//! converted audio before export.

pub mod io;
pub mod stereo;

pub use stereo::{widen, DEFAULT_WIDEN_DELAY_MS};

/// Primary floating-point sample type used across the frontend.
pub type Sample = f32;

/// An owned, interleaved audio buffer paired with its sample rate.
///
/// Samples are `f32` in the `[-1.0, 1.0]` range; the fixed-width integer
/// narrowing happens only at WAV export time.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    sample_rate: u32,
    channels: usize,
    samples: Vec<Sample>,
}

impl Waveform {
    /// Creates a waveform from an interleaved buffer.
    ///
    /// # Panics
    ///
    /// Panics if `channels` is zero or if the sample count is not divisible
    /// by `channels`.
    pub fn new(samples: Vec<Sample>, channels: usize, sample_rate: u32) -> Self {
        assert!(channels > 0, "channels must be non-zero");
        assert!(
            samples.len() % channels == 0,
            "buffer length {} must be divisible by channels {}",
            samples.len(),
            channels
        );
        Self {
            sample_rate,
            channels,
            samples,
        }
    }

    /// Creates a single-channel waveform.
    pub fn mono(samples: Vec<Sample>, sample_rate: u32) -> Self {
        Self::new(samples, 1, sample_rate)
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    #[inline]
    pub fn channels(&self) -> usize {
        self.channels
    }

    #[inline]
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    #[inline]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    #[inline]
    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_account_for_channels() {
        let wave = Waveform::new(vec![0.0; 8], 2, 48_000);
        assert_eq!(wave.frames(), 4);
        assert_eq!(wave.channels(), 2);
    }

    #[test]
    fn duration_follows_sample_rate() {
        let wave = Waveform::mono(vec![0.0; 24_000], 24_000);
        assert!((wave.duration() - 1.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic(expected = "divisible")]
    fn rejects_ragged_interleave() {
        let _ = Waveform::new(vec![0.0; 5], 2, 48_000);
    }
}

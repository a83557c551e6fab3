//! Stereo widening: delay one channel by a fixed offset to create a
//! simple binaural-style spread on mono conversion output.

use crate::{Sample, Waveform};

/// Default inter-channel delay applied to converted audio.
pub const DEFAULT_WIDEN_DELAY_MS: f32 = 0.6;

/// Widens a mono waveform into stereo by delaying the left channel.
///
/// The left channel is the input shifted right by
/// `round(sample_rate * delay_ms / 1000)` samples, with silence filling
/// the gap; the right channel is the input unchanged. Input that already
/// carries more than one channel is returned as-is.
pub fn widen(input: &Waveform, delay_ms: f32) -> Waveform {
    if input.channels() > 1 {
        return input.clone();
    }

    let len = input.frames();
    let delay = (input.sample_rate() as f64 * delay_ms as f64 / 1000.0).round() as usize;

    let mono = input.samples();
    let mut interleaved: Vec<Sample> = Vec::with_capacity(len * 2);
    for (i, &right) in mono.iter().enumerate() {
        // Shift clamps: the first `delay` left samples are silence, and a
        // delay past the end leaves the whole left channel silent.
        let left = if i >= delay { mono[i - delay] } else { 0.0 };
        interleaved.push(left);
        interleaved.push(right);
    }

    Waveform::new(interleaved, 2, input.sample_rate())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left_right(wave: &Waveform) -> (Vec<Sample>, Vec<Sample>) {
        let left = wave.samples().iter().step_by(2).copied().collect();
        let right = wave.samples().iter().skip(1).step_by(2).copied().collect();
        (left, right)
    }

    #[test]
    fn stereo_input_passes_through_unchanged() {
        let input = Waveform::new(vec![0.1, 0.2, 0.3, 0.4], 2, 44_100);
        let output = widen(&input, DEFAULT_WIDEN_DELAY_MS);
        assert_eq!(output, input);
    }

    #[test]
    fn zero_delay_duplicates_the_channel() {
        let input = Waveform::mono(vec![0.5, -0.25, 0.125], 48_000);
        let output = widen(&input, 0.0);
        assert_eq!(output.channels(), 2);
        assert_eq!(output.frames(), input.frames());
        let (left, right) = left_right(&output);
        assert_eq!(left, right);
        assert_eq!(right, input.samples());
    }

    #[test]
    fn one_millisecond_delay_shifts_left_by_one_sample() {
        // 1000 Hz * 1 ms = exactly one sample of delay.
        let samples: Vec<Sample> = (0..1000).map(|i| i as Sample / 1000.0).collect();
        let input = Waveform::mono(samples.clone(), 1000);
        let output = widen(&input, 1.0);

        let (left, right) = left_right(&output);
        assert_eq!(right, samples);
        assert_eq!(left[0], 0.0);
        assert_eq!(&left[1..], &samples[..999]);
    }

    #[test]
    fn delay_beyond_length_silences_left_channel() {
        let input = Waveform::mono(vec![0.3; 4], 1000);
        let output = widen(&input, 10.0);
        let (left, right) = left_right(&output);
        assert!(left.iter().all(|&s| s == 0.0));
        assert_eq!(right, input.samples());
    }

    #[test]
    fn output_length_matches_input() {
        let input = Waveform::mono(vec![0.1; 4410], 44_100);
        let output = widen(&input, DEFAULT_WIDEN_DELAY_MS);
        assert_eq!(output.frames(), input.frames());
        assert_eq!(output.sample_rate(), input.sample_rate());
    }
}

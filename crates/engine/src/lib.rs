//! Voice conversion engine boundary for the Revo frontend.
//!
//! The frontend never talks to a model runtime directly: everything goes
//! through [`VoiceCloneEngine`], with [`OnnxEngine`] as the bundled
//! implementation and [`ConversionSession`] holding the selected
//! model/index pair for the lifetime of a selection.

mod onnx;
mod params;
mod session;

pub use onnx::OnnxEngine;
pub use params::{
    ConversionParams, F0Method, CHUNK_SECS_RANGE, INDEX_RATE_RANGE, PITCH_RANGE, PROTECT_RANGE,
};
pub use session::ConversionSession;

use anyhow::Result;
use revo_audio::Waveform;

/// A voice conversion backend.
///
/// Implementations take a mono waveform and the per-call parameters and
/// return the converted waveform, possibly at a different sample rate.
pub trait VoiceCloneEngine: Send {
    fn convert(&mut self, input: &Waveform, params: &ConversionParams) -> Result<Waveform>;
}

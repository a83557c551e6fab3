//! Conversion parameters passed to the engine on every call.

use serde::{Deserialize, Serialize};

/// Pitch shift range in semitones.
pub const PITCH_RANGE: (i32, i32) = (-12, 12);
/// Index blend rate range.
pub const INDEX_RATE_RANGE: (f32, f32) = (0.0, 1.0);
/// Protect factor range.
pub const PROTECT_RANGE: (f32, f32) = (0.0, 0.5);
/// Chunk length range in seconds.
pub const CHUNK_SECS_RANGE: (u32, u32) = (1, 30);

/// Fundamental-frequency extraction algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum F0Method {
    Pm,
    Rmvpe,
}

impl F0Method {
    pub const ALL: [F0Method; 2] = [F0Method::Pm, F0Method::Rmvpe];

    pub fn id(self) -> &'static str {
        match self {
            F0Method::Pm => "pm",
            F0Method::Rmvpe => "rmvpe",
        }
    }
}

/// Per-call conversion settings.
///
/// Values are clamped into their documented ranges by [`clamped`]; the GUI
/// sliders enforce the same bounds, so clamping only matters for values
/// restored from a settings file or supplied programmatically.
///
/// [`clamped`]: ConversionParams::clamped
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConversionParams {
    /// Pitch shift in semitones, −12..12.
    pub pitch_shift: i32,
    /// F0 extraction method.
    pub f0_method: F0Method,
    /// Retrieval-index blend rate, 0..1.
    pub index_rate: f32,
    /// Consonant protection factor, 0..0.5.
    pub protect: f32,
    /// Convert in fixed-length chunks instead of one pass.
    pub use_chunks: bool,
    /// Chunk length in seconds, 1..30.
    pub chunk_secs: u32,
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            pitch_shift: 0,
            f0_method: F0Method::Pm,
            index_rate: 0.66,
            protect: 0.33,
            use_chunks: true,
            chunk_secs: 10,
        }
    }
}

impl ConversionParams {
    /// Returns a copy with every field clamped into range.
    pub fn clamped(self) -> Self {
        Self {
            pitch_shift: self.pitch_shift.clamp(PITCH_RANGE.0, PITCH_RANGE.1),
            f0_method: self.f0_method,
            index_rate: self.index_rate.clamp(INDEX_RATE_RANGE.0, INDEX_RATE_RANGE.1),
            protect: self.protect.clamp(PROTECT_RANGE.0, PROTECT_RANGE.1),
            use_chunks: self.use_chunks,
            chunk_secs: self.chunk_secs.clamp(CHUNK_SECS_RANGE.0, CHUNK_SECS_RANGE.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_ui() {
        let params = ConversionParams::default();
        assert_eq!(params.pitch_shift, 0);
        assert_eq!(params.f0_method, F0Method::Pm);
        assert!((params.index_rate - 0.66).abs() < 1e-6);
        assert!((params.protect - 0.33).abs() < 1e-6);
        assert!(params.use_chunks);
        assert_eq!(params.chunk_secs, 10);
    }

    #[test]
    fn clamped_pulls_values_into_range() {
        let params = ConversionParams {
            pitch_shift: 24,
            f0_method: F0Method::Rmvpe,
            index_rate: 1.5,
            protect: -0.1,
            use_chunks: false,
            chunk_secs: 90,
        }
        .clamped();

        assert_eq!(params.pitch_shift, 12);
        assert_eq!(params.index_rate, 1.0);
        assert_eq!(params.protect, 0.0);
        assert_eq!(params.chunk_secs, 30);
    }
}

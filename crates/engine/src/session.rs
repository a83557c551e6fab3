//! Conversion sessions.
//!
//! A session binds an engine to one model/index selection. Parameters are
//! supplied on every call instead of being mutated on shared engine state,
//! so two sessions can never corrupt each other's settings.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::{ConversionParams, OnnxEngine, VoiceCloneEngine};
use revo_audio::{io, Waveform};
use revo_registry::{ModelRef, Registry};

pub struct ConversionSession {
    engine: Box<dyn VoiceCloneEngine>,
    model: ModelRef,
    index: PathBuf,
}

impl std::fmt::Debug for ConversionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionSession")
            .field("model", &self.model)
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl ConversionSession {
    /// Opens a session for a scanned model.
    ///
    /// The model must be present in the registry's scanned list; an
    /// invalid selection fails without constructing an engine, leaving any
    /// session the caller already holds untouched.
    pub fn open(registry: &Registry, model_name: &str, index: &Path) -> Result<Self> {
        let model = registry.model(model_name).ok_or_else(|| {
            anyhow!("invalid model selection: `{model_name}` is not among the scanned models")
        })?;

        let engine = OnnxEngine::load(model.path())
            .with_context(|| format!("failed to load model `{model_name}`"))?;
        info!(
            "session opened for model `{}` with index {}",
            model.file_name(),
            index.display()
        );

        Ok(Self::with_engine(Box::new(engine), model, index.to_path_buf()))
    }

    /// Builds a session around an existing engine.
    pub fn with_engine(
        engine: Box<dyn VoiceCloneEngine>,
        model: ModelRef,
        index: PathBuf,
    ) -> Self {
        Self {
            engine,
            model,
            index,
        }
    }

    pub fn model(&self) -> &ModelRef {
        &self.model
    }

    pub fn index(&self) -> &Path {
        &self.index
    }

    /// Decodes `audio_path` and converts it with the given parameters.
    pub fn convert_file(
        &mut self,
        audio_path: &Path,
        params: &ConversionParams,
    ) -> Result<Waveform> {
        let input = io::load_wav(audio_path)?;
        self.convert_waveform(&input, params)
    }

    /// Converts a mono waveform, chunked or in one pass per the parameters.
    pub fn convert_waveform(
        &mut self,
        input: &Waveform,
        params: &ConversionParams,
    ) -> Result<Waveform> {
        let params = params.clamped();
        if params.use_chunks {
            self.convert_chunked(input, &params)
        } else {
            self.engine.convert(input, &params)
        }
    }

    /// Splits the input into fixed-length slices, converts each, and
    /// concatenates the results. Boundaries are hard cuts with no
    /// cross-fade; bounding peak memory is the point, seam artifacts are
    /// accepted.
    fn convert_chunked(
        &mut self,
        input: &Waveform,
        params: &ConversionParams,
    ) -> Result<Waveform> {
        let chunk_len = params.chunk_secs as usize * input.sample_rate() as usize;
        if chunk_len == 0 || input.is_empty() {
            return self.engine.convert(input, params);
        }

        let mut converted: Vec<f32> = Vec::new();
        let mut output_rate = input.sample_rate();
        for (i, chunk) in input.samples().chunks(chunk_len).enumerate() {
            let piece = Waveform::mono(chunk.to_vec(), input.sample_rate());
            let out = self
                .engine
                .convert(&piece, params)
                .with_context(|| format!("conversion failed on chunk {i}"))?;
            output_rate = out.sample_rate();
            converted.extend_from_slice(out.samples());
        }

        Ok(Waveform::mono(converted, output_rate))
    }
}

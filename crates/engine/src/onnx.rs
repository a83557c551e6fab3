//! ONNX-backed conversion engine.
//!
//! Input binding is heuristic: conversion graphs exported from different
//! toolchains disagree on input names, so the engine feeds the waveform to
//! the first plain float tensor input and fills the named side inputs
//! (pitch, speaker, length, index rate, protect) it recognizes.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use ort::{
    execution_providers::CPUExecutionProvider,
    session::Session,
    tensor::TensorElementType,
    value::{Value, ValueType},
};
use tracing::{info, warn};

use crate::{ConversionParams, VoiceCloneEngine};
use revo_audio::Waveform;

pub struct OnnxEngine {
    session: Session,
    model_name: String,
    /// Output rate parsed from an `_sr{rate}` filename token, if present.
    native_rate: Option<u32>,
}

impl std::fmt::Debug for OnnxEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxEngine")
            .field("model_name", &self.model_name)
            .field("native_rate", &self.native_rate)
            .finish_non_exhaustive()
    }
}

impl OnnxEngine {
    /// Loads a session from an `.onnx` model file.
    pub fn load(path: &Path) -> Result<Self> {
        let extension = path.extension().and_then(|ext| ext.to_str());
        if !extension.is_some_and(|ext| ext.eq_ignore_ascii_case("onnx")) {
            return Err(anyhow!(
                "unsupported model format {:?}: only .onnx models can be loaded",
                extension.unwrap_or("none")
            ));
        }

        let model_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let model_data = std::fs::read(path)
            .with_context(|| format!("failed to read model file {}", path.display()))?;

        let session = Session::builder()
            .context("failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("failed to set execution providers")?
            .commit_from_memory(&model_data)
            .with_context(|| format!("failed to load model {}", path.display()))?;

        info!(
            "loaded model `{}` with {} input(s), {} output(s)",
            model_name,
            session.inputs.len(),
            session.outputs.len()
        );

        let native_rate = parse_native_rate(&model_name);
        Ok(Self {
            session,
            model_name,
            native_rate,
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

impl VoiceCloneEngine for OnnxEngine {
    fn convert(&mut self, input: &Waveform, params: &ConversionParams) -> Result<Waveform> {
        if self.session.outputs.is_empty() {
            return Err(anyhow!("model has no outputs"));
        }

        let samples = input.samples();
        let input_infos: Vec<(String, ValueType)> = self
            .session
            .inputs
            .iter()
            .map(|input| (input.name.clone(), input.input_type.clone()))
            .collect();
        let output_name = self
            .session
            .outputs
            .first()
            .ok_or_else(|| anyhow!("model has no outputs"))?
            .name
            .clone();

        let mut model_inputs: Vec<(&str, Value)> = Vec::new();
        let mut audio_bound = false;

        for (name, value_type) in &input_infos {
            let element_type = match value_type {
                ValueType::Tensor { ty, .. } => *ty,
                other => {
                    warn!("input `{name}` is not a tensor (type {other:?}), skipping");
                    continue;
                }
            };
            let lowered = name.to_lowercase();

            match element_type {
                TensorElementType::Float32 => {
                    let (shape, data) = if lowered.contains("index") || lowered.contains("rate") {
                        (vec![1usize, 1], vec![params.index_rate])
                    } else if lowered.contains("protect") {
                        (vec![1, 1], vec![params.protect])
                    } else if !audio_bound {
                        audio_bound = true;
                        (vec![1, samples.len()], samples.to_vec())
                    } else {
                        warn!("unbound float input `{name}`, feeding zero");
                        (vec![1, 1], vec![0.0])
                    };
                    let value = Value::from_array((shape, data))
                        .with_context(|| format!("failed to build float tensor for `{name}`"))?
                        .into();
                    model_inputs.push((name.as_str(), value));
                }
                TensorElementType::Int64 => {
                    let scalar: i64 = if lowered.contains("pitch") || lowered.contains("f0up") {
                        i64::from(params.pitch_shift)
                    } else if lowered.contains("speaker") || lowered.contains("spk") {
                        0
                    } else if lowered.contains("length") {
                        samples.len() as i64
                    } else {
                        0
                    };
                    // Length-style inputs are rank 1, other scalars rank 2.
                    let (shape, data) = if lowered.contains("length") {
                        (vec![1usize], vec![scalar])
                    } else {
                        (vec![1, 1], vec![scalar])
                    };
                    let value = Value::from_array((shape, data))
                        .with_context(|| format!("failed to build int64 tensor for `{name}`"))?
                        .into();
                    model_inputs.push((name.as_str(), value));
                }
                other => {
                    warn!("unsupported element type {other:?} for input `{name}`, skipping");
                }
            }
        }

        if model_inputs.is_empty() {
            return Err(anyhow!("no usable inputs found on model `{}`", self.model_name));
        }
        if !audio_bound {
            return Err(anyhow!(
                "model `{}` has no float tensor input to receive audio",
                self.model_name
            ));
        }

        let outputs = self
            .session
            .run(model_inputs)
            .with_context(|| format!("inference failed for model `{}`", self.model_name))?;
        let output_value = outputs
            .get(output_name.as_str())
            .ok_or_else(|| anyhow!("output `{output_name}` missing from inference results"))?;

        let (shape, data) = output_value
            .try_extract_tensor::<f32>()
            .context("failed to extract f32 output tensor")?;

        let dims: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();
        let converted: Vec<f32> = match dims.len() {
            // [samples]
            1 => data[..dims[0]].to_vec(),
            // [batch, samples]: take the first batch row.
            2 => data[..dims[1].min(data.len())].to_vec(),
            _ => {
                return Err(anyhow!(
                    "unexpected output shape {dims:?} from model `{}`",
                    self.model_name
                ))
            }
        };

        let rate = self.native_rate.unwrap_or_else(|| input.sample_rate());
        Ok(Waveform::mono(converted, rate))
    }
}

/// Parses the sample-rate token from names like `singer_sr40000.onnx`.
fn parse_native_rate(model_name: &str) -> Option<u32> {
    model_name
        .split('_')
        .filter_map(|part| part.strip_prefix("sr"))
        .find_map(|rate| rate.parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sample_rate_token() {
        assert_eq!(parse_native_rate("singer_sr40000"), Some(40_000));
        assert_eq!(parse_native_rate("sr48000_singer"), Some(48_000));
        assert_eq!(parse_native_rate("singer"), None);
        assert_eq!(parse_native_rate("singer_srx"), None);
    }

    #[test]
    fn rejects_non_onnx_models() {
        let err = OnnxEngine::load(Path::new("weights/singerA.pth")).unwrap_err();
        assert!(err.to_string().contains("unsupported model format"));
    }
}

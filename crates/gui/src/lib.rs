//! GUI frontend built with `egui`/`eframe`.
//!
//! One window drives the whole conversion workflow: model and index
//! selection, input audio path, conversion parameters, and a preview of
//! the converted result. Conversion runs on the UI thread and blocks
//! until the engine returns; the app is single-threaded by design.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Result};
use eframe::{egui, App};
use egui::{Align2, Color32, ComboBox, Context as EguiContext, Slider, SliderClamping, TopBottomPanel};
use egui_plot::{Line, Plot, PlotPoints};
use rustfft::{num_complex::Complex32, Fft, FftPlanner};
use tracing::{error, info, warn};

use revo_audio::{io, widen, Waveform, DEFAULT_WIDEN_DELAY_MS};
use revo_engine::{ConversionParams, ConversionSession, F0Method};
use revo_registry::{resolve_index, ModelRef, Registry};

mod settings;
pub use settings::AppSettings;

const WAVEFORM_POINTS: usize = 4096;
const FFT_SIZE: usize = 1024;
const OUTPUT_SUFFIX: &str = "_converted";

pub struct GuiApp {
    registry: Registry,
    models: Vec<ModelRef>,
    indices: Vec<PathBuf>,
    selected_model: Option<usize>,
    selected_index: Option<usize>,
    audio_path: String,
    params: ConversionParams,
    session: Option<ConversionSession>,
    status: String,
    dialog: Option<ErrorDialog>,
    preview: Option<Preview>,
    fft: Arc<dyn Fft<f32>>,
    settings: AppSettings,
}

impl GuiApp {
    pub fn new(registry: Registry, settings: AppSettings) -> Self {
        let models = registry.models();
        let indices = registry.indices();
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        Self {
            registry,
            models,
            indices,
            selected_model: None,
            selected_index: None,
            audio_path: String::new(),
            params: settings.last_params.clamped(),
            session: None,
            status: "Ready.".to_string(),
            dialog: None,
            preview: None,
            fft,
            settings,
        }
    }

    pub fn run(self) -> eframe::Result<()> {
        let options = eframe::NativeOptions {
            viewport: egui::ViewportBuilder::default()
                .with_inner_size([960.0, 640.0])
                .with_min_inner_size([640.0, 480.0]),
            ..Default::default()
        };

        eframe::run_native(
            "Revo Voice Cloner",
            options,
            Box::new(move |_cc| Ok(Box::new(self))),
        )
    }

    fn rescan(&mut self) {
        self.registry.refresh();
        self.models = self.registry.models();
        self.indices = self.registry.indices();
        self.selected_model = None;
        self.selected_index = None;
        self.status = format!(
            "Found {} model(s), {} index file(s).",
            self.models.len(),
            self.indices.len()
        );
    }

    /// Selects a model and pairs it with its index file when one matches.
    fn select_model(&mut self, index: usize) {
        self.selected_model = Some(index);
        let Some(model) = self.models.get(index) else {
            return;
        };
        if let Some(resolved) = resolve_index(model, &self.indices) {
            self.selected_index = self.indices.iter().position(|p| p == resolved);
        }
    }

    /// Re-opens the session when the model/index selection changed.
    ///
    /// On failure any previously opened session is kept as-is.
    fn ensure_session(&mut self, model: &ModelRef, index: &Path) -> Result<()> {
        let stale = self.session.as_ref().map_or(true, |session| {
            session.model().file_name() != model.file_name() || session.index() != index
        });
        if stale {
            let session = ConversionSession::open(&self.registry, model.file_name(), index)?;
            self.session = Some(session);
            info!("model loaded: {}", model.file_name());
        }
        Ok(())
    }

    fn run_conversion(&mut self) {
        let model = self
            .selected_model
            .and_then(|i| self.models.get(i))
            .cloned();
        let index = self
            .selected_index
            .and_then(|i| self.indices.get(i))
            .cloned();
        let (Some(model), Some(index)) = (model, index) else {
            self.dialog = Some(ErrorDialog::missing_fields());
            return;
        };
        if self.audio_path.trim().is_empty() {
            self.dialog = Some(ErrorDialog::missing_fields());
            return;
        }
        let audio_path = PathBuf::from(self.audio_path.trim());

        if let Err(err) = self.ensure_session(&model, &index) {
            error!("failed to open session: {err:#}");
            self.dialog = Some(ErrorDialog {
                title: "Invalid model selection",
                message: format!("{err:#}"),
            });
            return;
        }

        match self.convert_selected(&audio_path) {
            Ok(status) => {
                info!("{status}");
                self.status = status;
            }
            Err(err) => {
                error!("conversion failed: {err:#}");
                self.dialog = Some(ErrorDialog {
                    title: "Conversion failed",
                    message: format!("{err:#}"),
                });
            }
        }
    }

    fn convert_selected(&mut self, audio_path: &Path) -> Result<String> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| anyhow!("no conversion session is open"))?;

        let converted = session.convert_file(audio_path, &self.params)?;
        let widened = widen(&converted, DEFAULT_WIDEN_DELAY_MS);
        let output_path = output_path_for(audio_path);
        io::save_wav(&output_path, &widened)?;

        self.preview = Some(Preview::from_waveform(&converted, self.fft.as_ref()));
        self.settings.last_params = self.params;
        if let Err(err) = self.settings.save() {
            warn!("failed to persist settings: {err:#}");
        }

        Ok(format!(
            "Converted audio at {} Hz with stereo effect -> {}",
            widened.sample_rate(),
            output_path.display()
        ))
    }

    fn show_model_controls(&mut self, ui: &mut egui::Ui) {
        let mut picked_model = None;
        let selected_text = self
            .selected_model
            .and_then(|i| self.models.get(i))
            .map(|m| m.file_name().to_string())
            .unwrap_or_else(|| "Select model".to_string());
        ComboBox::from_label("Model")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (i, model) in self.models.iter().enumerate() {
                    if ui
                        .selectable_label(self.selected_model == Some(i), model.file_name())
                        .clicked()
                    {
                        picked_model = Some(i);
                    }
                }
            });
        if let Some(i) = picked_model {
            self.select_model(i);
        }

        let selected_text = self
            .selected_index
            .and_then(|i| self.indices.get(i))
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "Select index".to_string());
        ComboBox::from_label("Index")
            .selected_text(selected_text)
            .show_ui(ui, |ui| {
                for (i, path) in self.indices.iter().enumerate() {
                    if ui
                        .selectable_label(self.selected_index == Some(i), path.display().to_string())
                        .clicked()
                    {
                        self.selected_index = Some(i);
                    }
                }
            });

        ui.horizontal(|ui| {
            ui.label("Input audio file:");
            ui.text_edit_singleline(&mut self.audio_path);
        });
    }

    fn show_parameter_controls(&mut self, ui: &mut egui::Ui) {
        ui.checkbox(&mut self.params.use_chunks, "Use chunks");
        ui.add_enabled(
            self.params.use_chunks,
            Slider::new(&mut self.params.chunk_secs, 1..=30)
                .text("Chunk size (seconds)")
                .clamping(SliderClamping::Always),
        );

        ui.add(
            Slider::new(&mut self.params.pitch_shift, -12..=12)
                .text("Pitch shift (semitones)")
                .clamping(SliderClamping::Always),
        );

        ComboBox::from_label("F0 method")
            .selected_text(self.params.f0_method.id())
            .show_ui(ui, |ui| {
                for method in F0Method::ALL {
                    ui.selectable_value(&mut self.params.f0_method, method, method.id());
                }
            });

        ui.add(
            Slider::new(&mut self.params.index_rate, 0.0..=1.0)
                .text("Index rate")
                .step_by(0.01)
                .clamping(SliderClamping::Always),
        );
        ui.add(
            Slider::new(&mut self.params.protect, 0.0..=0.5)
                .text("Protect")
                .step_by(0.01)
                .clamping(SliderClamping::Always),
        );
    }

    fn show_preview(&self, ui: &mut egui::Ui) {
        let Some(preview) = &self.preview else {
            ui.label("Convert a clip to see its waveform here.");
            return;
        };

        let waveform_points = PlotPoints::from_iter(
            preview
                .waveform
                .iter()
                .enumerate()
                .map(|(idx, value)| [idx as f64, *value as f64]),
        );
        Plot::new("output_waveform")
            .allow_scroll(false)
            .allow_zoom(false)
            .height(160.0)
            .show(ui, |plot_ui| {
                plot_ui.line(Line::new(waveform_points).color(Color32::LIGHT_GREEN));
            });

        if !preview.spectrum.is_empty() {
            let spectrum_points = PlotPoints::from_iter(
                preview
                    .spectrum
                    .iter()
                    .enumerate()
                    .map(|(idx, value)| [idx as f64, *value as f64]),
            );
            Plot::new("output_spectrum")
                .allow_scroll(false)
                .allow_zoom(false)
                .height(160.0)
                .show(ui, |plot_ui| {
                    plot_ui.line(Line::new(spectrum_points).color(Color32::LIGHT_BLUE));
                });
        } else {
            ui.label("Clip too short for a spectrum.");
        }
    }

    fn show_error_dialog(&mut self, ctx: &EguiContext) {
        let Some(dialog) = &self.dialog else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(dialog.title)
            .collapsible(false)
            .resizable(false)
            .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&dialog.message);
                if ui.button("OK").clicked() {
                    dismissed = true;
                }
            });
        if dismissed {
            self.dialog = None;
        }
    }
}

impl App for GuiApp {
    fn update(&mut self, ctx: &EguiContext, _frame: &mut eframe::Frame) {
        TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Revo Voice Cloner");
                ui.add_space(16.0);
                if ui.button("Rescan").clicked() {
                    self.rescan();
                }
            });
            ui.label(format!(
                "Weights: {} | Indexes: {}",
                self.registry.weight_root().display(),
                self.registry.index_root().display()
            ));
        });

        TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.label(&self.status);
        });

        egui::SidePanel::right("output_preview")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                ui.heading("Output");
                ui.separator();
                self.show_preview(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_model_controls(ui);
            ui.separator();
            self.show_parameter_controls(ui);
            ui.separator();

            ui.horizontal(|ui| {
                let converting = ui.button("Convert").clicked();
                if ui.button("Exit").clicked() {
                    self.settings.last_params = self.params;
                    if let Err(err) = self.settings.save() {
                        warn!("failed to persist settings: {err:#}");
                    }
                    ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                }
                if converting {
                    self.status = "Converting...".to_string();
                    self.run_conversion();
                }
            });
        });

        self.show_error_dialog(ctx);
    }
}

struct ErrorDialog {
    title: &'static str,
    message: String,
}

impl ErrorDialog {
    fn missing_fields() -> Self {
        Self {
            title: "Missing selection",
            message: "Please ensure a model, an index, and an input audio file are selected."
                .to_string(),
        }
    }
}

/// Downsampled waveform and spectrum of the most recent conversion.
struct Preview {
    waveform: Vec<f32>,
    spectrum: Vec<f32>,
}

impl Preview {
    fn from_waveform(wave: &Waveform, fft: &dyn Fft<f32>) -> Self {
        let samples = wave.samples();
        let stride = (samples.len() / WAVEFORM_POINTS).max(1);
        let waveform: Vec<f32> = samples.iter().step_by(stride).copied().collect();

        let spectrum = if samples.len() >= FFT_SIZE {
            let tail = &samples[samples.len() - FFT_SIZE..];
            let mut buffer: Vec<Complex32> =
                tail.iter().map(|&v| Complex32::new(v, 0.0)).collect();
            fft.process(&mut buffer);
            buffer[..FFT_SIZE / 2].iter().map(|bin| bin.norm()).collect()
        } else {
            Vec::new()
        };

        Self { waveform, spectrum }
    }
}

/// Output path next to the input: `clip.wav` -> `clip_converted.wav`.
fn output_path_for(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.wav"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_sits_next_to_the_input() {
        let path = output_path_for(Path::new("/clips/take1.wav"));
        assert_eq!(path, PathBuf::from("/clips/take1_converted.wav"));
    }

    #[test]
    fn output_path_handles_missing_stem() {
        let path = output_path_for(Path::new("clip.wav"));
        assert_eq!(path, PathBuf::from("clip_converted.wav"));
    }

    #[test]
    fn preview_downsamples_long_clips() {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let wave = Waveform::mono(vec![0.5; WAVEFORM_POINTS * 4], 44_100);

        let preview = Preview::from_waveform(&wave, fft.as_ref());
        assert!(preview.waveform.len() <= WAVEFORM_POINTS + 1);
        assert_eq!(preview.spectrum.len(), FFT_SIZE / 2);
    }

    #[test]
    fn preview_skips_spectrum_for_short_clips() {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);
        let wave = Waveform::mono(vec![0.5; 16], 44_100);

        let preview = Preview::from_waveform(&wave, fft.as_ref());
        assert_eq!(preview.waveform.len(), 16);
        assert!(preview.spectrum.is_empty());
    }
}

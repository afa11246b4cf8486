//! Main application struct for the equalizer
//!
//! Contains the EqApp which implements eframe::App. It owns the audio engine,
//! the background analyzer and the UI-side response curve, and binds the
//! parameter controls to the shared store.

use std::sync::Arc;

use eframe::egui::{self, Align, Layout, Pos2, RichText};

use super::theme;
use crate::analysis::{AnalysisTarget, AnalysisThread, AnalyzerConfig, PathReceiver, ResponseCurve, SpectrumAnalyzer};
use crate::dsp::parameter::{ParameterId, ParameterStore};
use crate::engine::{AudioEngine, AudioError, EqProcessor, ProcessorStats, SignalControl, SignalKind, TestSignal};
use crate::widgets::{param_slider, response_display, ResponseDisplayConfig};

/// Sample rate assumed for the response curve when no device is open.
const FALLBACK_SAMPLE_RATE: f64 = 48000.0;

/// Startup options for [`EqApp`].
#[derive(Clone, Debug)]
pub struct AppOptions {
    pub analyzer: AnalyzerConfig,
    pub signal: SignalKind,
    pub tone_hz: f32,
    /// Start audio on the first frame.
    pub autostart: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            analyzer: AnalyzerConfig::default(),
            signal: SignalKind::Sine,
            tone_hz: 440.0,
            autostart: true,
        }
    }
}

/// Everything that exists only while audio runs.
struct RunningAudio {
    analysis: AnalysisThread,
    paths: PathReceiver,
    stats: Arc<ProcessorStats>,
}

/// Main application state for the equalizer
pub struct EqApp {
    params: Arc<ParameterStore>,
    audio_engine: Result<AudioEngine, AudioError>,
    signal: Arc<SignalControl>,
    analyzer_config: AnalyzerConfig,
    target: Arc<AnalysisTarget>,
    running: Option<RunningAudio>,

    response: ResponseCurve,
    display: ResponseDisplayConfig,
    analyzer_path: Vec<Pos2>,
    response_points: Vec<Pos2>,

    /// Last state blob taken with "Store", for A/B comparison.
    stored_state: Option<String>,
    /// Last audio error message to display
    audio_error_message: Option<String>,
    theme_applied: bool,
}

impl EqApp {
    pub fn new(options: AppOptions) -> Self {
        let params = Arc::new(ParameterStore::new());
        let audio_engine = AudioEngine::new();

        let sample_rate = match &audio_engine {
            Ok(engine) => engine.sample_rate() as f64,
            Err(e) => {
                log::warn!("Audio unavailable: {}", e);
                FALLBACK_SAMPLE_RATE
            }
        };
        let audio_error_message = audio_engine.as_ref().err().map(|e| e.to_string());

        let display = ResponseDisplayConfig::default().with_analyzer_floor(options.analyzer.floor_db);

        let mut app = Self {
            response: ResponseCurve::new(Arc::clone(&params), sample_rate),
            params,
            audio_engine,
            signal: Arc::new(SignalControl::new(options.signal, options.tone_hz)),
            target: Arc::new(AnalysisTarget::new(sample_rate)),
            analyzer_config: options.analyzer,
            running: None,
            display,
            analyzer_path: Vec::new(),
            response_points: Vec::new(),
            stored_state: None,
            audio_error_message,
            theme_applied: false,
        };

        if options.autostart {
            app.start_audio();
        }
        app
    }

    /// Builds a processor and analyzer, then starts the stream.
    fn start_audio(&mut self) {
        if self.running.is_some() {
            return;
        }
        let Ok(engine) = self.audio_engine.as_mut() else {
            return;
        };

        let sample_rate = engine.sample_rate() as f64;
        let (processor, taps) = EqProcessor::new(
            Arc::clone(&self.params),
            self.analyzer_config.block_size,
            self.analyzer_config.queue_capacity,
        );
        let stats = processor.stats();
        let signal = TestSignal::new(Arc::clone(&self.signal), sample_rate as f32);

        // The analyzer follows the left channel.
        let (analyzer, paths) = SpectrumAnalyzer::new(taps.left, self.analyzer_config.clone(), sample_rate);
        self.target.set_sample_rate(sample_rate);
        self.response.set_sample_rate(sample_rate);

        let analysis = match AnalysisThread::spawn(analyzer, Arc::clone(&self.target)) {
            Ok(thread) => thread,
            Err(e) => {
                log::error!("Could not start analysis thread: {}", e);
                self.audio_error_message = Some(e.to_string());
                return;
            }
        };

        match engine.start(processor, signal) {
            Ok(()) => {
                self.audio_error_message = None;
                self.running = Some(RunningAudio { analysis, paths, stats });
            }
            Err(e) => {
                log::error!("Could not start audio: {}", e);
                self.audio_error_message = Some(e.to_string());
            }
        }
    }

    fn stop_audio(&mut self) {
        if let Ok(engine) = self.audio_engine.as_mut() {
            if let Err(e) = engine.stop() {
                self.audio_error_message = Some(e.to_string());
            }
        }
        if let Some(mut running) = self.running.take() {
            running.analysis.stop();
            log::info!(
                "Stopped after {} block(s), {} skipped coefficient update(s)",
                running.stats.blocks_processed(),
                running.stats.skipped_updates()
            );
        }
        self.analyzer_path.clear();
    }

    fn store_state(&mut self) {
        match self.params.save_state() {
            Ok(state) => self.stored_state = Some(state),
            Err(e) => self.audio_error_message = Some(e.to_string()),
        }
    }

    fn recall_state(&mut self) {
        if let Some(state) = &self.stored_state {
            if let Err(e) = self.params.load_state(state) {
                self.audio_error_message = Some(e.to_string());
            }
        }
    }

    /// Draw the top toolbar with audio controls and status
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) -> ToolbarActions {
        let mut actions = ToolbarActions::default();

        ui.horizontal(|ui| {
            ui.add_space(8.0);
            ui.label(RichText::new("SOUND WIZARD").size(18.0).color(theme::text::PRIMARY).strong());
            ui.add_space(16.0);
            ui.separator();

            match &self.audio_engine {
                Ok(engine) => {
                    if self.running.is_some() {
                        if ui.button("⏹ Stop Audio").clicked() {
                            actions.stop_audio = true;
                        }
                    } else if ui.button("▶ Start Audio").clicked() {
                        actions.start_audio = true;
                    }

                    ui.separator();
                    ui.label(RichText::new("Source").color(theme::text::SECONDARY));
                    let mut kind = self.signal.kind();
                    egui::ComboBox::from_id_salt("signal_kind")
                        .selected_text(kind.label())
                        .show_ui(ui, |ui| {
                            for choice in SignalKind::ALL {
                                ui.selectable_value(&mut kind, choice, choice.label());
                            }
                        });
                    if kind != self.signal.kind() {
                        self.signal.set_kind(kind);
                    }

                    if kind == SignalKind::Sine {
                        let mut tone = self.signal.tone_hz();
                        if ui
                            .add(egui::Slider::new(&mut tone, 20.0..=20000.0).logarithmic(true).suffix(" Hz"))
                            .changed()
                        {
                            self.signal.set_tone_hz(tone);
                        }
                    }

                    let mut level = self.signal.level();
                    if ui.add(egui::Slider::new(&mut level, 0.0..=1.0).text("Level")).changed() {
                        self.signal.set_level(level);
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        let (status_text, status_color) = if self.running.is_some() {
                            ("● Running", theme::accent::SUCCESS)
                        } else {
                            ("○ Stopped", theme::text::DISABLED)
                        };
                        ui.label(RichText::new(status_text).color(status_color).small());
                        ui.label(
                            RichText::new(format!("{}Hz • {}ch", engine.sample_rate(), engine.channels()))
                                .color(theme::text::SECONDARY)
                                .small(),
                        );
                    });
                }
                Err(e) => {
                    ui.label(RichText::new(format!("⚠ Audio unavailable: {}", e)).color(theme::accent::ERROR));
                }
            }
        });

        actions
    }

    /// Draw the parameter controls, one column per filter stage
    fn draw_controls(&mut self, ui: &mut egui::Ui) -> ToolbarActions {
        let mut actions = ToolbarActions::default();
        let groups: [(&str, egui::Color32, &[ParameterId]); 3] = [
            (
                "Low Cut",
                theme::stage::LOW_CUT,
                &[ParameterId::LowCutFreq, ParameterId::LowCutSlope],
            ),
            (
                "Peak",
                theme::stage::PEAK,
                &[ParameterId::PeakFreq, ParameterId::PeakGain, ParameterId::PeakQuality],
            ),
            (
                "High Cut",
                theme::stage::HIGH_CUT,
                &[ParameterId::HighCutFreq, ParameterId::HighCutSlope],
            ),
        ];

        ui.horizontal_top(|ui| {
            for (title, color, ids) in groups {
                ui.vertical(|ui| {
                    ui.label(RichText::new(title).color(color).strong());
                    for &id in ids {
                        param_slider(ui, &self.params, id);
                    }
                });
                ui.add_space(12.0);
            }

            ui.vertical(|ui| {
                ui.label(RichText::new("State").color(theme::text::SECONDARY).strong());
                if ui.button("Store").clicked() {
                    actions.store_state = true;
                }
                if ui
                    .add_enabled(self.stored_state.is_some(), egui::Button::new("Recall"))
                    .clicked()
                {
                    actions.recall_state = true;
                }
                if ui.button("Reset").clicked() {
                    actions.reset_params = true;
                }
            });
        });

        actions
    }

    /// Draw the bottom status bar
    fn draw_status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.add_space(8.0);

            if let Some(ref error) = self.audio_error_message {
                ui.label(RichText::new(format!("⚠ {}", error)).color(theme::accent::ERROR).small());
            } else if let Some(running) = &self.running {
                ui.label(
                    RichText::new(format!(
                        "{} blocks • {} skipped updates",
                        running.stats.blocks_processed(),
                        running.stats.skipped_updates()
                    ))
                    .color(theme::text::SECONDARY)
                    .small(),
                );
            } else {
                ui.label(RichText::new("Ready").color(theme::text::SECONDARY).small());
            }

            ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                ui.label(RichText::new("Sound Wizard v0.1").color(theme::text::DISABLED).small());
            });
        });
    }
}

/// Actions collected from the panels for deferred execution
#[derive(Default)]
struct ToolbarActions {
    start_audio: bool,
    stop_audio: bool,
    store_state: bool,
    recall_state: bool,
    reset_params: bool,
}

impl eframe::App for EqApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.theme_applied {
            theme::apply_theme(ctx);
            self.theme_applied = true;
        }

        if let Some(running) = self.running.as_mut() {
            running.paths.latest_path(&mut self.analyzer_path);
        }
        self.response.refresh();

        let toolbar_actions = egui::TopBottomPanel::top("toolbar")
            .frame(egui::Frame::none().fill(theme::background::PANEL).inner_margin(egui::Margin::symmetric(0.0, 8.0)))
            .show(ctx, |ui| self.draw_toolbar(ui))
            .inner;

        egui::TopBottomPanel::bottom("status_bar")
            .frame(egui::Frame::none().fill(theme::background::PANEL).inner_margin(egui::Margin::symmetric(0.0, 4.0)))
            .show(ctx, |ui| self.draw_status_bar(ui));

        let control_actions = egui::TopBottomPanel::bottom("controls")
            .frame(egui::Frame::none().fill(theme::background::MAIN).inner_margin(egui::Margin::same(12.0)))
            .show(ctx, |ui| self.draw_controls(ui))
            .inner;

        egui::CentralPanel::default().show(ctx, |ui| {
            let size = ui.available_size();
            self.display.size = size;
            let (_, plot) = response_display(
                ui,
                &self.response,
                &self.analyzer_path,
                &mut self.response_points,
                &self.display,
            );
            self.target.set_bounds(plot);
        });

        if toolbar_actions.start_audio {
            self.start_audio();
        }
        if toolbar_actions.stop_audio {
            self.stop_audio();
        }
        if control_actions.store_state {
            self.store_state();
        }
        if control_actions.recall_state {
            self.recall_state();
        }
        if control_actions.reset_params {
            for id in ParameterId::ALL {
                self.params.set(id, id.definition().default);
            }
        }

        ctx.request_repaint_after(self.analyzer_config.refresh_period());
    }
}

impl Drop for EqApp {
    fn drop(&mut self) {
        self.stop_audio();
    }
}

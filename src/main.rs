//! Sound Wizard - A real-time parametric equalizer
//!
//! Entry point for the application.

use clap::Parser;
use eframe::egui;

use sound_wizard::analysis::config::{MAX_REFRESH_HZ, MIN_REFRESH_HZ};
use sound_wizard::analysis::{AnalyzerConfig, FftOrder};
use sound_wizard::app::{AppOptions, EqApp};
use sound_wizard::engine::SignalKind;

/// Sound Wizard - three-band equalizer with a live spectrum analyzer
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Test signal fed through the equalizer
    #[arg(long, value_enum, default_value_t = SignalKind::Sine)]
    signal: SignalKind,

    /// Frequency of the sine test signal
    #[arg(long, default_value_t = 440.0)]
    tone_hz: f32,

    /// Analyzer FFT size (2048, 4096 or 8192)
    #[arg(long, default_value_t = 2048, value_parser = parse_fft_order)]
    fft_order: usize,

    /// Analyzer and display refresh rate (1 to 1000 Hz)
    #[arg(long, default_value_t = 60.0, value_parser = parse_refresh_hz)]
    refresh_hz: f32,

    /// Open the window without starting audio
    #[arg(long)]
    no_autostart: bool,
}

fn parse_fft_order(text: &str) -> Result<usize, String> {
    let size: usize = text.parse().map_err(|e| format!("{}", e))?;
    FftOrder::from_size(size)
        .map(FftOrder::size)
        .ok_or_else(|| format!("unsupported FFT size {}, expected 2048, 4096 or 8192", size))
}

fn parse_refresh_hz(text: &str) -> Result<f32, String> {
    let hz: f32 = text.parse().map_err(|e| format!("{}", e))?;
    if hz.is_finite() && (MIN_REFRESH_HZ..=MAX_REFRESH_HZ).contains(&hz) {
        Ok(hz)
    } else {
        Err(format!("refresh rate must be between {} and {} Hz", MIN_REFRESH_HZ, MAX_REFRESH_HZ))
    }
}

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let fft_order = FftOrder::from_size(args.fft_order).unwrap_or_default();
    let options = AppOptions {
        analyzer: AnalyzerConfig::default()
            .with_fft_order(fft_order)
            .with_refresh_hz(args.refresh_hz),
        signal: args.signal,
        tone_hz: args.tone_hz,
        autostart: !args.no_autostart,
    };
    log::info!("Starting with {:?}", options);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 560.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Sound Wizard"),
        ..Default::default()
    };

    eframe::run_native(
        "Sound Wizard",
        native_options,
        Box::new(|_cc| Ok(Box::new(EqApp::new(options)))),
    )
}

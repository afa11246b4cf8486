//! Spectrum analyzer pipeline and its optional worker thread.
//!
//! Each tick drains the channel tap into the rolling window, runs one FFT per
//! incoming block, turns every resulting frame into a path and publishes it
//! for the UI.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use eframe::egui::{Pos2, Rect};

use super::config::{AnalyzerConfig, FftOrder};
use super::fft::FftDataGenerator;
use super::path::{AnalyzerPathGenerator, PathReceiver};
use super::rolling::RollingBuffer;
use crate::dsp::parameter::AtomicF32;
use crate::engine::channel_queue::ChannelSampleReceiver;

/// Analyzer state for one channel.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    sample_rate: f64,
    receiver: ChannelSampleReceiver,
    incoming: Vec<f32>,
    rolling: RollingBuffer,
    fft: FftDataGenerator,
    fft_frame: Vec<f32>,
    paths: AnalyzerPathGenerator,
}

impl SpectrumAnalyzer {
    /// Creates an analyzer reading `receiver`, plus the UI's path reader.
    pub fn new(receiver: ChannelSampleReceiver, config: AnalyzerConfig, sample_rate: f64) -> (Self, PathReceiver) {
        let fft_size = config.fft_size();
        let (paths, path_receiver) = AnalyzerPathGenerator::new(config.queue_capacity);
        let paths = paths
            .with_resolution(config.path_resolution)
            .with_freq_range(config.min_freq, config.max_freq);

        let analyzer = Self {
            sample_rate,
            incoming: vec![0.0; receiver.block_size()],
            receiver,
            rolling: RollingBuffer::new(fft_size),
            fft: FftDataGenerator::new(config.fft_order, config.queue_capacity),
            fft_frame: vec![0.0; fft_size / 2],
            paths,
            config,
        };
        (analyzer, path_receiver)
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
    }

    /// Switches FFT size. The rolling window restarts from silence.
    pub fn set_fft_order(&mut self, order: FftOrder) {
        if order == self.config.fft_order {
            return;
        }
        self.config.fft_order = order;
        self.rolling.resize(order.size());
        self.fft.change_order(order);
        log::debug!("Analyzer FFT size set to {}", order.size());
    }

    /// Runs one analysis step for a display of `bounds`.
    ///
    /// Returns true if at least one new path was published.
    pub fn tick(&mut self, bounds: Rect) -> bool {
        let floor_db = self.config.floor_db;

        while self.receiver.num_complete_buffers_available() > 0 {
            if !self.receiver.get_audio_buffer(&mut self.incoming) {
                break;
            }
            self.rolling.push_block(&self.incoming);
            self.fft.produce_fft_data_for_rendering(self.rolling.samples(), floor_db);
        }

        let fft_size = self.fft.fft_size();
        let bin_width = self.config.bin_width(self.sample_rate);
        let mut published = false;

        while self.fft.num_available_fft_data_blocks() > 0 {
            if !self.fft.get_fft_data(&mut self.fft_frame) {
                break;
            }
            published |= self
                .paths
                .generate_path(&self.fft_frame, bounds, fft_size, bin_width, floor_db);
        }
        published
    }

    /// Blocks the audio thread dropped because ticks fell behind.
    pub fn dropped_blocks(&self) -> u64 {
        self.receiver.dropped_blocks()
    }

    pub fn last_path(&self) -> &[Pos2] {
        self.paths.last_path()
    }
}

/// Values the UI publishes for a background analyzer.
#[derive(Debug)]
pub struct AnalysisTarget {
    left: AtomicF32,
    top: AtomicF32,
    right: AtomicF32,
    bottom: AtomicF32,
    sample_rate: AtomicU64,
}

impl AnalysisTarget {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            left: AtomicF32::new(0.0),
            top: AtomicF32::new(0.0),
            right: AtomicF32::new(0.0),
            bottom: AtomicF32::new(0.0),
            sample_rate: AtomicU64::new(sample_rate.to_bits()),
        }
    }

    /// Records where the analyzer path will be drawn.
    ///
    /// Corners are stored individually; a tick racing a resize may see a
    /// mix, which only affects that one frame.
    pub fn set_bounds(&self, bounds: Rect) {
        self.left.set(bounds.left());
        self.top.set(bounds.top());
        self.right.set(bounds.right());
        self.bottom.set(bounds.bottom());
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_min_max(
            Pos2::new(self.left.get(), self.top.get()),
            Pos2::new(self.right.get(), self.bottom.get()),
        )
    }

    pub fn set_sample_rate(&self, sample_rate: f64) {
        self.sample_rate.store(sample_rate.to_bits(), Ordering::Relaxed);
    }

    pub fn sample_rate(&self) -> f64 {
        f64::from_bits(self.sample_rate.load(Ordering::Relaxed))
    }
}

/// Runs a [`SpectrumAnalyzer`] on its own thread at the configured rate.
pub struct AnalysisThread {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisThread {
    /// Moves `analyzer` onto a new thread that ticks until [`stop`](Self::stop).
    pub fn spawn(mut analyzer: SpectrumAnalyzer, target: Arc<AnalysisTarget>) -> std::io::Result<Self> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let period = analyzer.config().refresh_period();

        let handle = std::thread::Builder::new()
            .name("spectrum-analysis".to_string())
            .spawn(move || {
                log::info!("Analysis thread started ({:?} per tick)", period);
                let mut next_tick = Instant::now();

                while !stop_flag.load(Ordering::Acquire) {
                    let sample_rate = target.sample_rate();
                    if sample_rate != analyzer.sample_rate() {
                        analyzer.set_sample_rate(sample_rate);
                    }

                    let bounds = target.bounds();
                    if bounds.width() > 0.0 && bounds.height() > 0.0 {
                        analyzer.tick(bounds);
                    }

                    next_tick += period;
                    let now = Instant::now();
                    if next_tick > now {
                        std::thread::sleep(next_tick - now);
                    } else {
                        next_tick = now;
                    }
                }

                log::info!(
                    "Analysis thread stopped ({} block(s) dropped)",
                    analyzer.dropped_blocks()
                );
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Asks the thread to finish after its current tick and waits for it.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Analysis thread panicked");
            }
        }
    }
}

impl Drop for AnalysisThread {
    fn drop(&mut self) {
        self.stop();
    }
}

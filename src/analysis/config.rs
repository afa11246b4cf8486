//! Analyzer configuration.

use std::time::Duration;

use crate::dsp::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use crate::engine::queue::DEFAULT_QUEUE_CAPACITY;

/// FFT length, as a power of two.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FftOrder {
    #[default]
    Order2048,
    Order4096,
    Order8192,
}

impl FftOrder {
    pub const ALL: [FftOrder; 3] = [FftOrder::Order2048, FftOrder::Order4096, FftOrder::Order8192];

    /// Base-two exponent of the FFT size.
    pub fn order(self) -> u32 {
        match self {
            FftOrder::Order2048 => 11,
            FftOrder::Order4096 => 12,
            FftOrder::Order8192 => 13,
        }
    }

    /// Number of samples per transform.
    pub fn size(self) -> usize {
        1 << self.order()
    }

    pub fn from_size(size: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|order| order.size() == size)
    }
}

pub const DEFAULT_REFRESH_HZ: f32 = 60.0;
pub const MIN_REFRESH_HZ: f32 = 1.0;
pub const MAX_REFRESH_HZ: f32 = 1000.0;

/// Configuration for the spectrum analyzer pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct AnalyzerConfig {
    /// Transform length.
    pub fft_order: FftOrder,
    /// Lowest level shown, in dB. Silence maps here.
    pub floor_db: f32,
    /// Analysis ticks per second when running on its own thread.
    pub refresh_hz: f32,
    /// Left edge of the log-frequency axis.
    pub min_freq: f32,
    /// Right edge of the log-frequency axis. Bins above it are dropped.
    pub max_freq: f32,
    /// Use every n-th bin when building the path.
    pub path_resolution: usize,
    /// Samples per block shipped from the audio thread.
    pub block_size: usize,
    /// Slots in each queue of the pipeline.
    pub queue_capacity: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            fft_order: FftOrder::Order2048,
            floor_db: -48.0,
            refresh_hz: DEFAULT_REFRESH_HZ,
            min_freq: MIN_FREQUENCY_HZ,
            max_freq: MAX_FREQUENCY_HZ,
            path_resolution: 2,
            block_size: 512,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl AnalyzerConfig {
    pub fn fft_size(&self) -> usize {
        self.fft_order.size()
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_width(&self, sample_rate: f64) -> f32 {
        (sample_rate / self.fft_size() as f64) as f32
    }

    pub fn with_fft_order(mut self, fft_order: FftOrder) -> Self {
        self.fft_order = fft_order;
        self
    }

    pub fn with_floor_db(mut self, floor_db: f32) -> Self {
        self.floor_db = floor_db;
        self
    }

    /// Set the refresh rate, clamped to 1..=1000 Hz. Non-finite values
    /// leave the current rate in place.
    pub fn with_refresh_hz(mut self, refresh_hz: f32) -> Self {
        if refresh_hz.is_finite() {
            self.refresh_hz = refresh_hz.clamp(MIN_REFRESH_HZ, MAX_REFRESH_HZ);
        }
        self
    }

    /// Time between analysis ticks and display repaints.
    pub fn refresh_period(&self) -> Duration {
        let hz = if self.refresh_hz.is_finite() {
            self.refresh_hz.clamp(MIN_REFRESH_HZ, MAX_REFRESH_HZ)
        } else {
            DEFAULT_REFRESH_HZ
        };
        Duration::from_secs_f32(1.0 / hz)
    }

    pub fn with_freq_range(mut self, min: f32, max: f32) -> Self {
        self.min_freq = min;
        self.max_freq = max;
        self
    }

    pub fn with_path_resolution(mut self, resolution: usize) -> Self {
        self.path_resolution = resolution.max(1);
        self
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fft_order_sizes() {
        assert_eq!(FftOrder::Order2048.size(), 2048);
        assert_eq!(FftOrder::Order4096.size(), 4096);
        assert_eq!(FftOrder::Order8192.size(), 8192);
        assert_eq!(FftOrder::from_size(4096), Some(FftOrder::Order4096));
        assert_eq!(FftOrder::from_size(1000), None);
    }

    #[test]
    fn test_analyzer_config_default() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.fft_size(), 2048);
        assert_eq!(config.floor_db, -48.0);
        assert_eq!(config.path_resolution, 2);
        assert_eq!(config.queue_capacity, 30);
        assert_eq!(config.bin_width(48000.0), 48000.0 / 2048.0);
    }

    #[test]
    fn test_analyzer_config_builder() {
        let config = AnalyzerConfig::default()
            .with_fft_order(FftOrder::Order8192)
            .with_floor_db(-60.0)
            .with_refresh_hz(0.0)
            .with_path_resolution(0)
            .with_freq_range(30.0, 16000.0);

        assert_eq!(config.fft_size(), 8192);
        assert_eq!(config.floor_db, -60.0);
        assert_eq!(config.refresh_hz, 1.0);
        assert_eq!(config.path_resolution, 1);
        assert_eq!(config.min_freq, 30.0);
    }

    #[test]
    fn test_refresh_rate_rejects_non_finite() {
        let config = AnalyzerConfig::default().with_refresh_hz(f32::INFINITY);
        assert_eq!(config.refresh_hz, 60.0);
        let config = config.with_refresh_hz(f32::NAN);
        assert_eq!(config.refresh_hz, 60.0);
        assert_eq!(config.with_refresh_hz(1.0e9).refresh_hz, 1000.0);
    }

    #[test]
    fn test_refresh_period_never_zero() {
        let mut config = AnalyzerConfig::default();
        assert_eq!(config.refresh_period(), Duration::from_secs_f32(1.0 / 60.0));

        config.refresh_hz = f32::INFINITY;
        assert_eq!(config.refresh_period(), Duration::from_secs_f32(1.0 / 60.0));
        config.refresh_hz = 0.0;
        assert_eq!(config.refresh_period(), Duration::from_secs(1));
        config.refresh_hz = 1.0e9;
        assert!(config.refresh_period() >= Duration::from_micros(999));
    }
}

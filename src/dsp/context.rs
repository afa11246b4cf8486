//! Processing setup handed to the equalizer before audio starts.

use crate::error::EqError;

/// Host-provided stream configuration.
///
/// Everything the processor needs to preallocate: channel scratch, queue
/// slots and filter design all derive from these three values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProcessSpec {
    /// The audio sample rate in Hz (e.g., 44100, 48000).
    pub sample_rate: f64,
    /// Largest block the host will ever pass to `process`.
    pub max_block_size: usize,
    /// Number of interleaved or planar channels (1 or 2).
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Creates a spec for a stereo stream.
    pub fn new(sample_rate: f64, max_block_size: usize) -> Self {
        Self {
            sample_rate,
            max_block_size,
            num_channels: 2,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: f64) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_max_block_size(mut self, max_block_size: usize) -> Self {
        self.max_block_size = max_block_size;
        self
    }

    pub fn with_channels(mut self, num_channels: usize) -> Self {
        self.num_channels = num_channels;
        self
    }

    /// Returns the Nyquist frequency (half the sample rate).
    pub fn nyquist(&self) -> f64 {
        self.sample_rate / 2.0
    }

    /// Returns the duration of a full block in seconds.
    pub fn block_duration(&self) -> f64 {
        self.max_block_size as f64 / self.sample_rate
    }

    /// Checks the values a processor cannot work with.
    pub fn validate(&self) -> Result<(), EqError> {
        if !(self.sample_rate.is_finite() && self.sample_rate > 0.0) {
            return Err(EqError::InvalidSampleRate(self.sample_rate));
        }
        if self.max_block_size == 0 {
            return Err(EqError::InvalidBlockSize(self.max_block_size));
        }
        if !(1..=2).contains(&self.num_channels) {
            return Err(EqError::UnsupportedLayout {
                inputs: self.num_channels,
                outputs: self.num_channels,
            });
        }
        Ok(())
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self::new(44100.0, 512)
    }
}

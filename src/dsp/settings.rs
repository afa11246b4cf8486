//! Chain settings snapshot.
//!
//! A `ChainSettings` is read from the parameter store at the start of every
//! processing block and handed to the coefficient designer.

use serde::{Deserialize, Serialize};

/// Lowest frequency the designer or the display will work with.
pub const MIN_FREQUENCY_HZ: f32 = 20.0;

/// Highest frequency exposed by the parameter layout.
pub const MAX_FREQUENCY_HZ: f32 = 20000.0;

/// Fraction of the sample rate frequencies are clamped to before design.
///
/// Keeps every cutoff strictly below Nyquist after a sample-rate change.
pub const MAX_SAMPLE_RATE_FRACTION: f32 = 0.49;

/// Cut filter steepness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slope {
    /// 12 dB/oct, one biquad section.
    #[default]
    Db12,
    /// 24 dB/oct, two sections.
    Db24,
    /// 36 dB/oct, three sections.
    Db36,
    /// 48 dB/oct, four sections.
    Db48,
}

impl Slope {
    /// All slopes in ascending steepness.
    pub const ALL: [Slope; 4] = [Slope::Db12, Slope::Db24, Slope::Db36, Slope::Db48];

    /// Choice labels, indexed by `index()`.
    pub const LABELS: &'static [&'static str] = &["12 dB/Oct", "24 dB/Oct", "36 dB/Oct", "48 dB/Oct"];

    /// Zero-based choice index.
    pub fn index(self) -> usize {
        match self {
            Slope::Db12 => 0,
            Slope::Db24 => 1,
            Slope::Db36 => 2,
            Slope::Db48 => 3,
        }
    }

    /// Converts a (possibly fractional) choice value into a slope.
    ///
    /// Out-of-range values saturate to the nearest end.
    pub fn from_choice(value: f32) -> Self {
        if !value.is_finite() {
            return Slope::Db12;
        }
        let index = value.round().clamp(0.0, 3.0) as usize;
        Self::ALL[index]
    }

    /// Butterworth order of the cascade (2, 4, 6 or 8 poles).
    pub fn order(self) -> usize {
        (self.index() + 1) * 2
    }

    /// Number of active biquad sections.
    pub fn num_sections(self) -> usize {
        self.index() + 1
    }

    /// Attenuation per octave.
    pub fn db_per_octave(self) -> u32 {
        (self.index() as u32 + 1) * 12
    }
}

/// Positions of the stages within a mono chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainPosition {
    LowCut,
    Peak,
    HighCut,
}

/// Snapshot of all equalizer settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainSettings {
    pub low_cut_freq: f32,
    pub high_cut_freq: f32,
    pub peak_freq: f32,
    pub peak_gain_db: f32,
    pub peak_quality: f32,
    pub low_cut_slope: Slope,
    pub high_cut_slope: Slope,
}

impl ChainSettings {
    /// Linear amplitude of the peak gain.
    pub fn peak_gain_linear(&self) -> f32 {
        10.0_f32.powf(self.peak_gain_db / 20.0)
    }

    /// Returns a copy with every frequency clamped into the range the
    /// designer accepts at `sample_rate`.
    pub fn clamped_for(&self, sample_rate: f64) -> Self {
        let ceiling = (sample_rate as f32 * MAX_SAMPLE_RATE_FRACTION).max(MIN_FREQUENCY_HZ);
        let clamp = |freq: f32| freq.clamp(MIN_FREQUENCY_HZ, ceiling);

        Self {
            low_cut_freq: clamp(self.low_cut_freq),
            high_cut_freq: clamp(self.high_cut_freq),
            peak_freq: clamp(self.peak_freq),
            ..*self
        }
    }
}

impl Default for ChainSettings {
    fn default() -> Self {
        Self {
            low_cut_freq: MIN_FREQUENCY_HZ,
            high_cut_freq: MAX_FREQUENCY_HZ,
            peak_freq: 750.0,
            peak_gain_db: 0.0,
            peak_quality: 1.0,
            low_cut_slope: Slope::Db12,
            high_cut_slope: Slope::Db12,
        }
    }
}

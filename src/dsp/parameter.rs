//! Parameter layout and the shared, lock-free parameter store.
//!
//! The UI writes parameters, the audio thread reads them once per block.
//! Each value is individually atomic; a snapshot taken while the UI is moving
//! several knobs may mix old and new values, which is acceptable here.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crate::dsp::settings::{ChainSettings, Slope, MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use crate::error::EqError;

/// How a parameter value should be displayed and interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParameterDisplay {
    /// Linear scaling with a unit suffix (e.g., "dB").
    Linear { unit: &'static str },
    /// Logarithmic scaling, used for frequencies.
    Logarithmic { unit: &'static str },
    /// Discrete steps with named values.
    Discrete { labels: &'static [&'static str] },
}

impl ParameterDisplay {
    /// Returns the unit string, if applicable.
    pub fn unit(&self) -> Option<&'static str> {
        match self {
            Self::Linear { unit } | Self::Logarithmic { unit } => Some(unit),
            Self::Discrete { .. } => None,
        }
    }

    /// Formats `value` for a label.
    pub fn format(&self, value: f32) -> String {
        match self {
            Self::Logarithmic { unit } if value >= 1000.0 => {
                format!("{:.2} k{}", value / 1000.0, unit)
            }
            Self::Linear { unit } | Self::Logarithmic { unit } => format!("{:.1} {}", value, unit),
            Self::Discrete { labels } => labels
                .get(value.round().max(0.0) as usize)
                .copied()
                .unwrap_or("?")
                .to_string(),
        }
    }
}

/// Identifies one of the equalizer's parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParameterId {
    LowCutFreq,
    HighCutFreq,
    PeakFreq,
    PeakGain,
    PeakQuality,
    LowCutSlope,
    HighCutSlope,
}

impl ParameterId {
    /// Every parameter, in layout order.
    pub const ALL: [ParameterId; 7] = [
        ParameterId::LowCutFreq,
        ParameterId::HighCutFreq,
        ParameterId::PeakFreq,
        ParameterId::PeakGain,
        ParameterId::PeakQuality,
        ParameterId::LowCutSlope,
        ParameterId::HighCutSlope,
    ];

    /// Position in the layout and in the store.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Host-visible parameter name.
    pub fn name(self) -> &'static str {
        self.definition().name
    }

    /// Looks a parameter up by its host-visible name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.name() == name)
    }

    /// Range, default and display of this parameter.
    pub fn definition(self) -> &'static ParameterDefinition {
        &LAYOUT[self.index()]
    }
}

/// Definition of a parameter: range, default, snapping and display.
#[derive(Clone, Debug)]
pub struct ParameterDefinition {
    /// Identifier within the layout.
    pub id: ParameterId,
    /// Host-visible name.
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
    /// Snapping interval; 0 disables snapping.
    pub step: f32,
    /// Skew applied when mapping to and from the normalized 0..1 range.
    /// 1.0 is linear, values below 1 spread out the low end.
    pub skew: f32,
    pub display: ParameterDisplay,
}

impl ParameterDefinition {
    const fn frequency(id: ParameterId, name: &'static str, default: f32) -> Self {
        Self {
            id,
            name,
            min: MIN_FREQUENCY_HZ,
            max: MAX_FREQUENCY_HZ,
            default,
            step: 1.0,
            skew: 0.25,
            display: ParameterDisplay::Logarithmic { unit: "Hz" },
        }
    }

    const fn slope(id: ParameterId, name: &'static str) -> Self {
        Self {
            id,
            name,
            min: 0.0,
            max: 3.0,
            default: 0.0,
            step: 1.0,
            skew: 1.0,
            display: ParameterDisplay::Discrete { labels: Slope::LABELS },
        }
    }

    /// Clamps to the range and snaps to the step.
    pub fn constrain(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default;
        }
        let snapped = if self.step > 0.0 {
            let (min, step) = (self.min as f64, self.step as f64);
            (min + ((value as f64 - min) / step).round() * step) as f32
        } else {
            value
        };
        snapped.clamp(self.min, self.max)
    }

    /// Maps a value in the parameter's range to 0.0..=1.0.
    pub fn normalize(&self, value: f32) -> f32 {
        if (self.max - self.min).abs() < f32::EPSILON {
            return 0.0;
        }
        let proportion = ((value - self.min) / (self.max - self.min)).clamp(0.0, 1.0);
        if (self.skew - 1.0).abs() < f32::EPSILON {
            proportion
        } else {
            proportion.powf(self.skew)
        }
    }

    /// Maps 0.0..=1.0 back to the parameter's range.
    pub fn denormalize(&self, normalized: f32) -> f32 {
        let proportion = normalized.clamp(0.0, 1.0);
        let proportion = if (self.skew - 1.0).abs() < f32::EPSILON || proportion <= 0.0 {
            proportion
        } else {
            (proportion.ln() / self.skew).exp()
        };
        self.min + proportion * (self.max - self.min)
    }
}

static LAYOUT: [ParameterDefinition; 7] = [
    ParameterDefinition::frequency(ParameterId::LowCutFreq, "LowCut Freq", MIN_FREQUENCY_HZ),
    ParameterDefinition::frequency(ParameterId::HighCutFreq, "HighCut Freq", MAX_FREQUENCY_HZ),
    ParameterDefinition::frequency(ParameterId::PeakFreq, "Peak Freq", 750.0),
    ParameterDefinition {
        id: ParameterId::PeakGain,
        name: "Peak Gain",
        min: -24.0,
        max: 24.0,
        default: 0.0,
        step: 0.5,
        skew: 1.0,
        display: ParameterDisplay::Linear { unit: "dB" },
    },
    ParameterDefinition {
        id: ParameterId::PeakQuality,
        name: "Peak Quality",
        min: 0.1,
        max: 10.0,
        default: 1.0,
        step: 0.05,
        skew: 1.0,
        display: ParameterDisplay::Linear { unit: "" },
    },
    ParameterDefinition::slope(ParameterId::LowCutSlope, "LowCut Slope"),
    ParameterDefinition::slope(ParameterId::HighCutSlope, "HighCut Slope"),
];

/// An atomic f32 for lock-free parameter updates.
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Shared parameter values.
///
/// Wrap in an `Arc` and hand clones to the UI, the audio processor and the
/// response curve.
#[derive(Debug)]
pub struct ParameterStore {
    values: [AtomicF32; 7],
    /// Bumped on every successful write. Readers compare generations instead
    /// of registering change listeners.
    generation: AtomicU64,
}

impl ParameterStore {
    /// Creates a store holding every parameter's default.
    pub fn new() -> Self {
        Self {
            values: std::array::from_fn(|i| AtomicF32::new(LAYOUT[i].default)),
            generation: AtomicU64::new(0),
        }
    }

    /// The full parameter layout.
    pub fn layout() -> &'static [ParameterDefinition] {
        &LAYOUT
    }

    /// Current value of `id`.
    #[inline]
    pub fn get(&self, id: ParameterId) -> f32 {
        self.values[id.index()].get()
    }

    /// Sets `id`, clamped and snapped to its definition.
    ///
    /// Returns the value actually stored.
    pub fn set(&self, id: ParameterId, value: f32) -> f32 {
        let value = id.definition().constrain(value);
        self.values[id.index()].set(value);
        self.generation.fetch_add(1, Ordering::Release);
        value
    }

    /// Sets `id` from a normalized 0..1 value.
    pub fn set_normalized(&self, id: ParameterId, normalized: f32) -> f32 {
        self.set(id, id.definition().denormalize(normalized))
    }

    /// Change counter; differs whenever any parameter was written since the
    /// last read.
    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Reads every field into a settings snapshot.
    pub fn chain_settings(&self) -> ChainSettings {
        ChainSettings {
            low_cut_freq: self.get(ParameterId::LowCutFreq),
            high_cut_freq: self.get(ParameterId::HighCutFreq),
            peak_freq: self.get(ParameterId::PeakFreq),
            peak_gain_db: self.get(ParameterId::PeakGain),
            peak_quality: self.get(ParameterId::PeakQuality),
            low_cut_slope: Slope::from_choice(self.get(ParameterId::LowCutSlope)),
            high_cut_slope: Slope::from_choice(self.get(ParameterId::HighCutSlope)),
        }
    }

    /// Writes every field of `settings` into the store.
    pub fn apply_settings(&self, settings: &ChainSettings) {
        self.set(ParameterId::LowCutFreq, settings.low_cut_freq);
        self.set(ParameterId::HighCutFreq, settings.high_cut_freq);
        self.set(ParameterId::PeakFreq, settings.peak_freq);
        self.set(ParameterId::PeakGain, settings.peak_gain_db);
        self.set(ParameterId::PeakQuality, settings.peak_quality);
        self.set(ParameterId::LowCutSlope, settings.low_cut_slope.index() as f32);
        self.set(ParameterId::HighCutSlope, settings.high_cut_slope.index() as f32);
    }

    /// Serializes the current settings for the host to store.
    pub fn save_state(&self) -> Result<String, EqError> {
        Ok(serde_json::to_string(&self.chain_settings())?)
    }

    /// Restores settings previously produced by [`save_state`](Self::save_state).
    pub fn load_state(&self, state: &str) -> Result<(), EqError> {
        let settings: ChainSettings = serde_json::from_str(state)?;
        self.apply_settings(&settings);
        Ok(())
    }
}

impl Default for ParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_layout_matches_ids() {
        for (index, def) in ParameterStore::layout().iter().enumerate() {
            assert_eq!(def.id.index(), index);
        }
        assert_eq!(ParameterStore::layout().len(), ParameterId::ALL.len());
    }

    #[test]
    fn test_parameter_names() {
        assert_eq!(ParameterId::LowCutFreq.name(), "LowCut Freq");
        assert_eq!(ParameterId::PeakQuality.name(), "Peak Quality");
        assert_eq!(ParameterId::from_name("HighCut Slope"), Some(ParameterId::HighCutSlope));
        assert_eq!(ParameterId::from_name("Volume"), None);
    }

    #[test]
    fn test_defaults_produce_default_settings() {
        let store = ParameterStore::new();
        assert_eq!(store.chain_settings(), ChainSettings::default());
    }

    #[test]
    fn test_set_clamps_and_snaps() {
        let store = ParameterStore::new();
        assert_eq!(store.set(ParameterId::PeakGain, 40.0), 24.0);
        assert_eq!(store.set(ParameterId::PeakGain, 3.3), 3.5);
        assert_eq!(store.set(ParameterId::PeakFreq, 5.0), 20.0);
        assert_eq!(store.set(ParameterId::LowCutSlope, 2.4), 2.0);
        assert_eq!(store.set(ParameterId::PeakQuality, f32::NAN), 1.0);
    }

    #[test]
    fn test_generation_advances_on_write() {
        let store = ParameterStore::new();
        let before = store.generation();
        store.set(ParameterId::PeakFreq, 1000.0);
        assert_ne!(store.generation(), before);
    }

    #[test]
    fn test_slope_parameters_map_to_enum() {
        let store = ParameterStore::new();
        store.set(ParameterId::LowCutSlope, 3.0);
        store.set(ParameterId::HighCutSlope, 1.0);
        let settings = store.chain_settings();
        assert_eq!(settings.low_cut_slope, Slope::Db48);
        assert_eq!(settings.high_cut_slope, Slope::Db24);
    }

    #[test]
    fn test_skewed_normalize_denormalize() {
        let def = ParameterId::PeakFreq.definition();
        let normalized = def.normalize(1000.0);
        assert_relative_eq!(def.denormalize(normalized), 1000.0, epsilon = 0.5);
        assert_eq!(def.normalize(20.0), 0.0);
        assert_eq!(def.normalize(20000.0), 1.0);
        // Skew pushes 1 kHz well past the linear position.
        assert!(normalized > 0.4, "1 kHz should sit mid-slider: {}", normalized);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(ParameterId::PeakFreq.definition().display.format(1500.0), "1.50 kHz");
        assert_eq!(ParameterId::PeakGain.definition().display.format(-6.0), "-6.0 dB");
        assert_eq!(ParameterId::LowCutSlope.definition().display.format(2.0), "36 dB/Oct");
        assert_eq!(ParameterId::PeakGain.definition().display.unit(), Some("dB"));
    }

    #[test]
    fn test_state_round_trip_restores_settings() {
        let store = ParameterStore::new();
        store.set(ParameterId::PeakGain, -12.0);
        store.set(ParameterId::HighCutSlope, 2.0);
        let state = store.save_state().unwrap();

        let restored = ParameterStore::new();
        restored.load_state(&state).unwrap();
        assert_eq!(restored.chain_settings(), store.chain_settings());
    }

    #[test]
    fn test_load_state_rejects_garbage() {
        let store = ParameterStore::new();
        assert!(matches!(store.load_state("not json"), Err(EqError::State(_))));
    }
}

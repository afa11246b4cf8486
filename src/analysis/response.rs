//! Frequency response of the current settings, for drawing over the analyzer.

use std::sync::Arc;

use eframe::egui::{Pos2, Rect};

use super::scale::{gain_to_decibels, jmap, map_from_log10};
use crate::dsp::chain::MonoChain;
use crate::dsp::design::design;
use crate::dsp::parameter::ParameterStore;
use crate::dsp::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

/// Display range of the response curve, shared with the grid drawn behind it.
#[derive(Clone, Debug, PartialEq)]
pub struct ResponseConfig {
    pub min_db: f32,
    pub max_db: f32,
    pub min_freq: f32,
    pub max_freq: f32,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            min_db: -24.0,
            max_db: 24.0,
            min_freq: MIN_FREQUENCY_HZ,
            max_freq: MAX_FREQUENCY_HZ,
        }
    }
}

/// Mirrors the parameter store into a private chain and evaluates it.
///
/// Lives on the UI thread; the audio thread's chains are never touched.
pub struct ResponseCurve {
    params: Arc<ParameterStore>,
    chain: MonoChain,
    sample_rate: f64,
    config: ResponseConfig,
    last_generation: Option<u64>,
}

impl ResponseCurve {
    pub fn new(params: Arc<ParameterStore>, sample_rate: f64) -> Self {
        let mut curve = Self {
            params,
            chain: MonoChain::new(),
            sample_rate,
            config: ResponseConfig::default(),
            last_generation: None,
        };
        curve.refresh();
        curve
    }

    /// Axis ranges the curve is mapped onto.
    pub fn config(&self) -> &ResponseConfig {
        &self.config
    }

    /// Changes the rate the curve is evaluated at and redesigns immediately.
    pub fn set_sample_rate(&mut self, sample_rate: f64) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.last_generation = None;
            self.refresh();
        }
    }

    /// Redesigns the chain if any parameter changed since the last call.
    ///
    /// Returns true if the chain was updated.
    pub fn refresh(&mut self) -> bool {
        // Read the generation first so a write racing the snapshot shows up
        // as a new generation on the next call.
        let generation = self.params.generation();
        if self.last_generation == Some(generation) {
            return false;
        }

        let settings = self.params.chain_settings().clamped_for(self.sample_rate);
        match design(&settings, self.sample_rate) {
            Ok(coefficients) => {
                self.chain
                    .apply(&coefficients, settings.low_cut_slope, settings.high_cut_slope);
                self.last_generation = Some(generation);
                true
            }
            Err(err) => {
                log::warn!("Response curve not updated: {}", err);
                self.last_generation = Some(generation);
                false
            }
        }
    }

    /// Chain response at `freq`, in dB.
    pub fn magnitude_db(&self, freq: f32) -> f32 {
        let magnitude = self.chain.magnitude_for_frequency(freq as f64, self.sample_rate);
        gain_to_decibels(magnitude as f32, -100.0)
    }

    /// Fills `path` with one point per horizontal pixel of `bounds`.
    pub fn generate_path(&self, bounds: Rect, path: &mut Vec<Pos2>) {
        path.clear();
        let width = bounds.width().floor() as usize;
        if width == 0 {
            return;
        }

        path.extend((0..width).map(|pixel| {
            let proportion = pixel as f32 / width as f32;
            let freq = map_from_log10(proportion, self.config.min_freq, self.config.max_freq);
            let db = self.magnitude_db(freq);
            let y = jmap(db, self.config.min_db, self.config.max_db, bounds.bottom(), bounds.top());
            Pos2::new(bounds.left() + pixel as f32, y)
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::parameter::ParameterId;
    use approx::assert_relative_eq;
    use eframe::egui::vec2;

    #[test]
    fn test_defaults_are_flat() {
        let curve = ResponseCurve::new(Arc::new(ParameterStore::new()), 48000.0);
        for freq in [200.0, 750.0, 5000.0] {
            assert!(curve.magnitude_db(freq).abs() < 0.1, "{} Hz: {}", freq, curve.magnitude_db(freq));
        }
    }

    #[test]
    fn test_refresh_follows_generation() {
        let params = Arc::new(ParameterStore::new());
        let mut curve = ResponseCurve::new(Arc::clone(&params), 48000.0);
        assert!(!curve.refresh(), "Nothing changed since construction");

        params.set(ParameterId::PeakFreq, 2000.0);
        params.set(ParameterId::PeakGain, 12.0);
        assert!(curve.refresh());
        assert_relative_eq!(curve.magnitude_db(2000.0), 12.0, epsilon = 0.1);
        assert!(!curve.refresh());
    }

    #[test]
    fn test_path_spans_bounds() {
        let params = Arc::new(ParameterStore::new());
        params.set(ParameterId::LowCutFreq, 500.0);
        params.set(ParameterId::LowCutSlope, 3.0);
        let curve = ResponseCurve::new(params, 44100.0);

        let bounds = Rect::from_min_size(Pos2::new(0.0, 0.0), vec2(200.0, 100.0));
        let mut path = Vec::new();
        curve.generate_path(bounds, &mut path);

        assert_eq!(path.len(), 200);
        assert_eq!(path[0].x, 0.0);
        // Deep low cut: far below the bottom at 20 Hz, 0 dB mid-height by 3.5 kHz.
        assert!(path[0].y > 100.0);
        assert_relative_eq!(path[150].y, 50.0, epsilon = 1.0);
    }

    #[test]
    fn test_sample_rate_change_redesigns() {
        let params = Arc::new(ParameterStore::new());
        params.set(ParameterId::HighCutFreq, 15000.0);
        let mut curve = ResponseCurve::new(Arc::clone(&params), 48000.0);
        let before = curve.magnitude_db(10000.0);

        // At 22.05 kHz the cutoff is clamped just under Nyquist.
        curve.set_sample_rate(22050.0);
        assert_ne!(curve.magnitude_db(10000.0), before);
        assert!(curve.magnitude_db(10000.0).is_finite());
    }
}

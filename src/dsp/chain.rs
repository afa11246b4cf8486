//! Filter chains.
//!
//! A `MonoChain` is LowCut → Peak → HighCut. Each cut stage owns four biquad
//! sections of which only the first `slope + 1` are ever active.

use crate::dsp::biquad::{BiquadCoeffs, BiquadSection};
use crate::dsp::design::{ChainCoefficients, CutCoefficients, MAX_CUT_SECTIONS};
use crate::dsp::settings::{ChainPosition, Slope};

/// A cascade of up to four biquad sections.
#[derive(Clone, Debug)]
pub struct CutFilter {
    sections: [BiquadSection; MAX_CUT_SECTIONS],
}

impl CutFilter {
    /// Creates a cut filter with every section active and transparent.
    pub fn new() -> Self {
        Self {
            sections: Default::default(),
        }
    }

    /// Replaces the coefficients of section `index`.
    pub fn set_coefficients(&mut self, index: usize, coeffs: BiquadCoeffs) {
        if let Some(section) = self.sections.get_mut(index) {
            section.set_coefficients(coeffs);
        }
    }

    pub fn set_bypassed(&mut self, index: usize, bypassed: bool) {
        if let Some(section) = self.sections.get_mut(index) {
            section.set_bypassed(bypassed);
        }
    }

    /// Out-of-range indices report as bypassed.
    pub fn is_bypassed(&self, index: usize) -> bool {
        self.sections.get(index).map_or(true, BiquadSection::is_bypassed)
    }

    pub fn section(&self, index: usize) -> Option<&BiquadSection> {
        self.sections.get(index)
    }

    /// Number of sections currently processing audio.
    pub fn active_sections(&self) -> usize {
        self.sections.iter().filter(|s| !s.is_bypassed()).count()
    }

    /// Runs `block` through every active section in order.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        for section in &mut self.sections {
            section.process(block);
        }
    }

    /// Linear magnitude of the active sections at `freq`.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        self.sections
            .iter()
            .filter(|s| !s.is_bypassed())
            .map(|s| s.coefficients().magnitude_for_frequency(freq, sample_rate))
            .product()
    }

    pub fn reset(&mut self) {
        for section in &mut self.sections {
            section.reset();
        }
    }
}

impl Default for CutFilter {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads a designed cascade into `cut`.
///
/// All sections are bypassed first, then sections `0..=slope` receive their
/// coefficients and are re-activated, so nothing beyond the configured order
/// can run with stale coefficients. Sections that were already active keep
/// their history; only sections newly entering the cascade start from zero.
pub fn update_cut_filter(cut: &mut CutFilter, coefficients: &CutCoefficients, slope: Slope) {
    let mut was_active = [false; MAX_CUT_SECTIONS];
    for (flag, section) in was_active.iter_mut().zip(&mut cut.sections) {
        *flag = !section.is_bypassed();
        section.mark_bypassed(true);
    }

    let active = slope.num_sections().min(coefficients.len());
    for (index, coeffs) in coefficients.sections().iter().take(active).enumerate() {
        let section = &mut cut.sections[index];
        section.set_coefficients(*coeffs);
        section.mark_bypassed(false);
        if !was_active[index] {
            section.reset();
        }
    }
}

/// One channel's complete filter path.
#[derive(Clone, Debug, Default)]
pub struct MonoChain {
    low_cut: CutFilter,
    peak: BiquadSection,
    high_cut: CutFilter,
}

impl MonoChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn low_cut(&self) -> &CutFilter {
        &self.low_cut
    }

    pub fn low_cut_mut(&mut self) -> &mut CutFilter {
        &mut self.low_cut
    }

    pub fn high_cut(&self) -> &CutFilter {
        &self.high_cut
    }

    pub fn high_cut_mut(&mut self) -> &mut CutFilter {
        &mut self.high_cut
    }

    pub fn peak(&self) -> &BiquadSection {
        &self.peak
    }

    pub fn set_peak_coefficients(&mut self, coeffs: BiquadCoeffs) {
        self.peak.set_coefficients(coeffs);
    }

    pub fn set_peak_bypassed(&mut self, bypassed: bool) {
        self.peak.set_bypassed(bypassed);
    }

    /// Whether a whole stage is out of the signal path.
    ///
    /// A cut stage counts as bypassed only when all of its sections are.
    pub fn is_bypassed(&self, position: ChainPosition) -> bool {
        match position {
            ChainPosition::LowCut => self.low_cut.active_sections() == 0,
            ChainPosition::Peak => self.peak.is_bypassed(),
            ChainPosition::HighCut => self.high_cut.active_sections() == 0,
        }
    }

    /// Loads a full set of designed coefficients.
    pub fn apply(&mut self, coefficients: &ChainCoefficients, low_slope: Slope, high_slope: Slope) {
        self.set_peak_coefficients(coefficients.peak);
        update_cut_filter(&mut self.low_cut, &coefficients.low_cut, low_slope);
        update_cut_filter(&mut self.high_cut, &coefficients.high_cut, high_slope);
    }

    /// Filters `block` in place: low cut, then peak, then high cut.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        self.low_cut.process(block);
        self.peak.process(block);
        self.high_cut.process(block);
    }

    /// Combined linear magnitude of every active stage at `freq`.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        let mut magnitude = 1.0;
        if !self.peak.is_bypassed() {
            magnitude *= self.peak.coefficients().magnitude_for_frequency(freq, sample_rate);
        }
        magnitude *= self.low_cut.magnitude_for_frequency(freq, sample_rate);
        magnitude *= self.high_cut.magnitude_for_frequency(freq, sample_rate);
        magnitude
    }

    /// Returns true if both chains hold bit-identical coefficients and bypass masks.
    pub fn same_shape_as(&self, other: &MonoChain) -> bool {
        let cut_matches = |a: &CutFilter, b: &CutFilter| {
            (0..MAX_CUT_SECTIONS).all(|i| match (a.section(i), b.section(i)) {
                (Some(x), Some(y)) => {
                    x.is_bypassed() == y.is_bypassed()
                        && (x.is_bypassed() || x.coefficients() == y.coefficients())
                }
                _ => false,
            })
        };

        self.peak.coefficients() == other.peak.coefficients()
            && self.peak.is_bypassed() == other.peak.is_bypassed()
            && cut_matches(&self.low_cut, &other.low_cut)
            && cut_matches(&self.high_cut, &other.high_cut)
    }

    /// Clears every section's history.
    pub fn reset(&mut self) {
        self.low_cut.reset();
        self.peak.reset();
        self.high_cut.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsp::design::{design, make_low_cut_filter};
    use crate::dsp::settings::ChainSettings;

    #[test]
    fn test_bypass_invariant_for_all_slopes() {
        for slope in Slope::ALL {
            let settings = ChainSettings {
                low_cut_freq: 100.0,
                low_cut_slope: slope,
                ..Default::default()
            };
            let coeffs = make_low_cut_filter(&settings, 48000.0).unwrap();
            let mut cut = CutFilter::new();
            update_cut_filter(&mut cut, &coeffs, slope);

            for index in 0..MAX_CUT_SECTIONS {
                let expected_active = index <= slope.index();
                assert_eq!(
                    !cut.is_bypassed(index),
                    expected_active,
                    "slope {:?}, section {}",
                    slope,
                    index
                );
            }
            assert_eq!(cut.active_sections(), slope.num_sections());
        }
    }

    #[test]
    fn test_lowering_slope_bypasses_upper_sections() {
        let mut cut = CutFilter::new();
        for slope in [Slope::Db48, Slope::Db12, Slope::Db36, Slope::Db24] {
            let settings = ChainSettings {
                low_cut_slope: slope,
                ..Default::default()
            };
            let coeffs = make_low_cut_filter(&settings, 44100.0).unwrap();
            update_cut_filter(&mut cut, &coeffs, slope);
            assert_eq!(cut.active_sections(), slope.num_sections());
        }
    }

    #[test]
    fn test_active_sections_hold_designed_coefficients() {
        let settings = ChainSettings {
            low_cut_freq: 300.0,
            low_cut_slope: Slope::Db36,
            ..Default::default()
        };
        let coeffs = make_low_cut_filter(&settings, 48000.0).unwrap();
        let mut cut = CutFilter::new();
        update_cut_filter(&mut cut, &coeffs, Slope::Db36);

        for (index, designed) in coeffs.sections().iter().enumerate() {
            assert_eq!(cut.section(index).unwrap().coefficients(), designed);
        }
    }

    #[test]
    fn test_repeated_updates_keep_history() {
        let settings = ChainSettings {
            low_cut_freq: 200.0,
            low_cut_slope: Slope::Db24,
            ..Default::default()
        };
        let coeffs = make_low_cut_filter(&settings, 48000.0).unwrap();
        let mut cut = CutFilter::new();
        update_cut_filter(&mut cut, &coeffs, Slope::Db24);

        let mut step = [1.0_f32; 32];
        cut.process(&mut step);

        // A parameter "tweak" with identical coefficients must not restart the filter.
        update_cut_filter(&mut cut, &coeffs, Slope::Db24);
        let mut next = [0.0_f32; 4];
        cut.process(&mut next);
        assert!(next.iter().any(|&s| s != 0.0), "History was cleared by the update");
    }

    #[test]
    fn test_newly_activated_section_starts_clean() {
        let settings = ChainSettings {
            low_cut_freq: 200.0,
            low_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let steep = make_low_cut_filter(&settings, 48000.0).unwrap();
        let gentle = make_low_cut_filter(
            &ChainSettings {
                low_cut_slope: Slope::Db12,
                ..settings
            },
            48000.0,
        )
        .unwrap();

        let mut cut = CutFilter::new();
        update_cut_filter(&mut cut, &steep, Slope::Db48);
        let mut step = [1.0_f32; 32];
        cut.process(&mut step);

        update_cut_filter(&mut cut, &gentle, Slope::Db12);
        update_cut_filter(&mut cut, &steep, Slope::Db48);
        for index in 1..MAX_CUT_SECTIONS {
            let mut single = cut.section(index).unwrap().clone();
            let mut next = [0.0_f32; 2];
            single.process(&mut next);
            assert_eq!(next, [0.0, 0.0], "section {} kept stale history", index);
        }
    }

    #[test]
    fn test_out_of_range_section_is_bypassed() {
        let cut = CutFilter::new();
        assert!(cut.is_bypassed(MAX_CUT_SECTIONS));
    }

    #[test]
    fn test_chains_share_shape_but_not_state() {
        let settings = ChainSettings {
            low_cut_freq: 80.0,
            high_cut_freq: 9000.0,
            peak_gain_db: 6.0,
            low_cut_slope: Slope::Db24,
            high_cut_slope: Slope::Db48,
            ..Default::default()
        };
        let coeffs = design(&settings, 48000.0).unwrap();

        let mut left = MonoChain::new();
        let mut right = MonoChain::new();
        left.apply(&coeffs, settings.low_cut_slope, settings.high_cut_slope);
        right.apply(&coeffs, settings.low_cut_slope, settings.high_cut_slope);
        assert!(left.same_shape_as(&right));

        let mut left_block = [1.0_f32; 64];
        let mut right_block = [0.0_f32; 64];
        left.process(&mut left_block);
        right.process(&mut right_block);

        // Same impulse on both now yields different output: histories differ.
        let mut left_next = [0.0_f32; 4];
        let mut right_next = [0.0_f32; 4];
        left.process(&mut left_next);
        right.process(&mut right_next);
        assert_ne!(left_next, right_next);
        assert!(right_next.iter().all(|&s| s == 0.0));
        assert!(left.same_shape_as(&right));
    }

    #[test]
    fn test_stage_bypass_reporting() {
        let mut chain = MonoChain::new();
        assert!(!chain.is_bypassed(ChainPosition::Peak));
        chain.set_peak_bypassed(true);
        assert!(chain.is_bypassed(ChainPosition::Peak));

        for index in 0..MAX_CUT_SECTIONS {
            chain.low_cut_mut().set_bypassed(index, true);
        }
        assert!(chain.is_bypassed(ChainPosition::LowCut));
        assert!(!chain.is_bypassed(ChainPosition::HighCut));
    }

    #[test]
    fn test_magnitude_ignores_bypassed_sections() {
        let mut chain = MonoChain::new();
        chain.low_cut_mut().set_coefficients(0, BiquadCoeffs::high_pass(48000.0, 5000.0, 0.7));
        chain.low_cut_mut().set_bypassed(0, true);
        assert!((chain.magnitude_for_frequency(100.0, 48000.0) - 1.0).abs() < 1e-6);
    }
}

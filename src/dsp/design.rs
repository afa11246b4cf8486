//! Coefficient designer.
//!
//! Pure functions from `(ChainSettings, sample rate)` to biquad coefficients.
//! Nothing here allocates, so the audio thread can call it every block.

use std::f64::consts::PI;

use crate::dsp::biquad::BiquadCoeffs;
use crate::dsp::settings::{ChainSettings, Slope};
use crate::error::DesignError;

/// Maximum number of sections in a cut cascade.
pub const MAX_CUT_SECTIONS: usize = 4;

/// Ordered Butterworth cascade for one cut filter.
///
/// Holds exactly `slope.num_sections()` valid sets; the rest of the array is
/// never exposed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CutCoefficients {
    sections: [BiquadCoeffs; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutCoefficients {
    /// The designed sections, lowest Q first.
    pub fn sections(&self) -> &[BiquadCoeffs] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Everything needed to update one mono chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ChainCoefficients {
    pub peak: BiquadCoeffs,
    pub low_cut: CutCoefficients,
    pub high_cut: CutCoefficients,
}

#[derive(Clone, Copy)]
enum CutKind {
    HighPass,
    LowPass,
}

fn check_sample_rate(sample_rate: f64) -> Result<(), DesignError> {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        Ok(())
    } else {
        Err(DesignError::InvalidSampleRate(sample_rate))
    }
}

fn check_frequency(freq: f64, sample_rate: f64) -> Result<(), DesignError> {
    let nyquist = sample_rate / 2.0;
    if freq.is_finite() && freq > 0.0 && freq < nyquist {
        Ok(())
    } else {
        Err(DesignError::FrequencyOutOfRange { freq, nyquist })
    }
}

/// Q of section `index` in an even-order Butterworth cascade.
///
/// Pole pair `k` sits at angle `(2k + 1) * PI / (2 * order)` from the real
/// axis and has `Q = 1 / (2 cos(theta))`, which increases with `k`.
pub fn butterworth_q(order: usize, index: usize) -> f64 {
    let theta = (2.0 * index as f64 + 1.0) * PI / (2.0 * order as f64);
    1.0 / (2.0 * theta.cos())
}

fn design_cut(
    kind: CutKind,
    freq: f64,
    sample_rate: f64,
    slope: Slope,
) -> Result<CutCoefficients, DesignError> {
    check_sample_rate(sample_rate)?;
    check_frequency(freq, sample_rate)?;

    let order = slope.order();
    let len = slope.num_sections();
    let mut sections = [BiquadCoeffs::IDENTITY; MAX_CUT_SECTIONS];

    for (index, section) in sections.iter_mut().take(len).enumerate() {
        let q = butterworth_q(order, index);
        *section = match kind {
            CutKind::HighPass => BiquadCoeffs::high_pass(sample_rate, freq, q),
            CutKind::LowPass => BiquadCoeffs::low_pass(sample_rate, freq, q),
        };
    }

    Ok(CutCoefficients { sections, len })
}

/// Designs the peak (bell) stage.
pub fn make_peak_filter(settings: &ChainSettings, sample_rate: f64) -> Result<BiquadCoeffs, DesignError> {
    check_sample_rate(sample_rate)?;
    let freq = settings.peak_freq as f64;
    check_frequency(freq, sample_rate)?;

    let q = settings.peak_quality as f64;
    if !(q.is_finite() && q > 0.0) {
        return Err(DesignError::InvalidQuality(q));
    }

    let gain = settings.peak_gain_linear() as f64;
    if !(gain.is_finite() && gain > 0.0) {
        return Err(DesignError::InvalidGain(gain));
    }

    Ok(BiquadCoeffs::peak(sample_rate, freq, q, gain))
}

/// Designs the low-cut (highpass) cascade.
pub fn make_low_cut_filter(settings: &ChainSettings, sample_rate: f64) -> Result<CutCoefficients, DesignError> {
    design_cut(
        CutKind::HighPass,
        settings.low_cut_freq as f64,
        sample_rate,
        settings.low_cut_slope,
    )
}

/// Designs the high-cut (lowpass) cascade.
pub fn make_high_cut_filter(settings: &ChainSettings, sample_rate: f64) -> Result<CutCoefficients, DesignError> {
    design_cut(
        CutKind::LowPass,
        settings.high_cut_freq as f64,
        sample_rate,
        settings.high_cut_slope,
    )
}

/// Designs all three stages at once.
pub fn design(settings: &ChainSettings, sample_rate: f64) -> Result<ChainCoefficients, DesignError> {
    Ok(ChainCoefficients {
        peak: make_peak_filter(settings, sample_rate)?,
        low_cut: make_low_cut_filter(settings, sample_rate)?,
        high_cut: make_high_cut_filter(settings, sample_rate)?,
    })
}

//! Second-order IIR sections.
//!
//! Coefficients and the delay line are kept in `f64`; only the samples going
//! in and out are `f32`, since narrow sections near DC lose their gain in
//! single precision. The delay line runs in Direct Form I so that swapping
//! coefficients mid-stream keeps the input/output history meaningful.

use std::f64::consts::PI;

use rustfft::num_complex::Complex;

/// Biquad filter coefficients, normalized by `a0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoeffs {
    /// Coefficients that pass the signal through unchanged.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Builds a coefficient set from raw (un-normalized) values.
    fn normalized(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Self {
        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }

    /// Peaking (bell) filter, RBJ cookbook.
    ///
    /// `gain` is linear amplitude, so 1.0 yields an identity response.
    pub fn peak(sample_rate: f64, freq: f64, q: f64, gain: f64) -> Self {
        let a = gain.sqrt();
        let omega = 2.0 * PI * freq / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);

        Self::normalized(
            1.0 + alpha * a,
            -2.0 * cos_omega,
            1.0 - alpha * a,
            1.0 + alpha / a,
            -2.0 * cos_omega,
            1.0 - alpha / a,
        )
    }

    /// Second-order highpass section.
    pub fn high_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);

        Self::normalized(
            (1.0 + cos_omega) / 2.0,
            -(1.0 + cos_omega),
            (1.0 + cos_omega) / 2.0,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Second-order lowpass section.
    pub fn low_pass(sample_rate: f64, freq: f64, q: f64) -> Self {
        let omega = 2.0 * PI * freq / sample_rate;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * q);

        Self::normalized(
            (1.0 - cos_omega) / 2.0,
            1.0 - cos_omega,
            (1.0 - cos_omega) / 2.0,
            1.0 + alpha,
            -2.0 * cos_omega,
            1.0 - alpha,
        )
    }

    /// Linear magnitude of the transfer function at `freq`.
    pub fn magnitude_for_frequency(&self, freq: f64, sample_rate: f64) -> f64 {
        let omega = 2.0 * PI * freq / sample_rate;
        // z^-1 evaluated on the unit circle
        let z1 = Complex::from_polar(1.0, -omega);
        let z2 = z1 * z1;

        let numerator = Complex::new(self.b0, 0.0) + z1 * self.b1 + z2 * self.b2;
        let denominator = Complex::new(1.0, 0.0) + z1 * self.a1 + z2 * self.a2;

        (numerator / denominator).norm()
    }

    /// Returns true if every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        self.b0.is_finite()
            && self.b1.is_finite()
            && self.b2.is_finite()
            && self.a1.is_finite()
            && self.a2.is_finite()
    }
}

impl Default for BiquadCoeffs {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Biquad filter state (delay line).
#[derive(Clone, Copy, Debug, Default)]
pub struct BiquadState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl BiquadState {
    /// Process a single sample through the biquad filter.
    #[inline]
    pub fn process(&mut self, input: f32, coeffs: &BiquadCoeffs) -> f32 {
        let input = input as f64;
        let output = coeffs.b0 * input + coeffs.b1 * self.x1 + coeffs.b2 * self.x2
            - coeffs.a1 * self.y1
            - coeffs.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        // Flush denormals so a decaying tail never slows the callback down.
        self.y1 = if output.abs() < 1.0e-20 { 0.0 } else { output };

        self.y1 as f32
    }

    /// Reset the filter state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Returns true if any history sample is NaN or infinite.
    pub fn is_corrupt(&self) -> bool {
        !(self.x1.is_finite() && self.x2.is_finite() && self.y1.is_finite() && self.y2.is_finite())
    }
}

/// One section of a filter chain: owned coefficients, history, and a bypass flag.
#[derive(Clone, Debug)]
pub struct BiquadSection {
    coeffs: BiquadCoeffs,
    state: BiquadState,
    bypassed: bool,
}

impl BiquadSection {
    /// Creates an active identity section.
    pub fn new() -> Self {
        Self {
            coeffs: BiquadCoeffs::IDENTITY,
            state: BiquadState::default(),
            bypassed: false,
        }
    }

    /// Replaces the coefficients wholesale. History is preserved.
    #[inline]
    pub fn set_coefficients(&mut self, coeffs: BiquadCoeffs) {
        self.coeffs = coeffs;
    }

    /// Current coefficients.
    pub fn coefficients(&self) -> &BiquadCoeffs {
        &self.coeffs
    }

    /// Marks the section bypassed or active.
    ///
    /// A section re-entering the active state starts from a clean history.
    #[inline]
    pub fn set_bypassed(&mut self, bypassed: bool) {
        if self.bypassed && !bypassed {
            self.state.reset();
        }
        self.bypassed = bypassed;
    }

    /// Sets the bypass flag without touching history.
    #[inline]
    pub(crate) fn mark_bypassed(&mut self, bypassed: bool) {
        self.bypassed = bypassed;
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypassed
    }

    /// Filters `block` in place unless bypassed.
    #[inline]
    pub fn process(&mut self, block: &mut [f32]) {
        if self.bypassed {
            return;
        }
        for sample in block.iter_mut() {
            *sample = self.state.process(*sample, &self.coeffs);
        }
        if self.state.is_corrupt() {
            self.state.reset();
        }
    }

    /// Clears the delay line.
    pub fn reset(&mut self) {
        self.state.reset();
    }
}

impl Default for BiquadSection {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identity_passthrough() {
        let mut section = BiquadSection::new();
        let mut block = [0.5, -0.25, 1.0, 0.0];
        section.process(&mut block);
        assert_eq!(block, [0.5, -0.25, 1.0, 0.0]);
    }

    #[test]
    fn test_peak_unity_gain_is_identity_response() {
        let coeffs = BiquadCoeffs::peak(44100.0, 750.0, 1.0, 1.0);
        for freq in [20.0, 750.0, 5000.0, 18000.0] {
            assert_relative_eq!(coeffs.magnitude_for_frequency(freq, 44100.0), 1.0, epsilon = 1e-4);
        }
    }

    #[test]
    fn test_peak_center_gain() {
        let gain = 10.0_f64.powf(12.0 / 20.0);
        let coeffs = BiquadCoeffs::peak(48000.0, 1000.0, 2.0, gain);
        assert_relative_eq!(coeffs.magnitude_for_frequency(1000.0, 48000.0), gain, epsilon = 1e-3);
    }

    #[test]
    fn test_high_pass_response() {
        let coeffs = BiquadCoeffs::high_pass(48000.0, 1000.0, std::f64::consts::FRAC_1_SQRT_2);
        // -3 dB at the cutoff for a Butterworth section
        assert_relative_eq!(
            coeffs.magnitude_for_frequency(1000.0, 48000.0),
            std::f64::consts::FRAC_1_SQRT_2,
            epsilon = 1e-3
        );
        assert!(coeffs.magnitude_for_frequency(50.0, 48000.0) < 0.01);
        assert_relative_eq!(coeffs.magnitude_for_frequency(15000.0, 48000.0), 1.0, epsilon = 0.02);
    }

    #[test]
    fn test_low_pass_response() {
        let coeffs = BiquadCoeffs::low_pass(48000.0, 1000.0, std::f64::consts::FRAC_1_SQRT_2);
        assert_relative_eq!(coeffs.magnitude_for_frequency(20.0, 48000.0), 1.0, epsilon = 1e-3);
        assert!(coeffs.magnitude_for_frequency(10000.0, 48000.0) < 0.02);
    }

    #[test]
    fn test_set_coefficients_keeps_history() {
        let mut section = BiquadSection::new();
        section.set_coefficients(BiquadCoeffs::low_pass(48000.0, 500.0, 0.7));
        let mut block = [1.0; 16];
        section.process(&mut block);
        let before = section.state;

        section.set_coefficients(BiquadCoeffs::low_pass(48000.0, 600.0, 0.7));
        assert_eq!(section.state.y1, before.y1);
        assert_eq!(section.state.x1, before.x1);
    }

    #[test]
    fn test_reactivation_clears_history() {
        let mut section = BiquadSection::new();
        section.set_coefficients(BiquadCoeffs::low_pass(48000.0, 500.0, 0.7));
        let mut block = [1.0; 16];
        section.process(&mut block);

        section.set_bypassed(true);
        section.set_bypassed(false);

        let mut silence = [0.0; 4];
        section.process(&mut silence);
        assert!(silence.iter().all(|&s| s == 0.0), "Reactivated section should start silent");
    }

    #[test]
    fn test_bypassed_section_is_skipped() {
        let mut section = BiquadSection::new();
        section.set_coefficients(BiquadCoeffs::low_pass(48000.0, 100.0, 0.7));
        section.set_bypassed(true);
        let mut block = [1.0, -1.0, 1.0, -1.0];
        section.process(&mut block);
        assert_eq!(block, [1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_narrow_low_peak_keeps_designed_gain() {
        // +24 dB, Q 10 at 20 Hz puts the poles right against the unit circle
        let sample_rate = 96000.0;
        let gain = 10.0_f64.powf(24.0 / 20.0);
        let mut section = BiquadSection::new();
        section.set_coefficients(BiquadCoeffs::peak(sample_rate, 20.0, 10.0, gain));

        let len = 6 * sample_rate as usize;
        let input: Vec<f32> = (0..len)
            .map(|n| (0.5 * (2.0 * PI * 20.0 * n as f64 / sample_rate).sin()) as f32)
            .collect();
        let mut output = input.clone();
        for block in output.chunks_mut(480) {
            section.process(block);
        }

        let tail = len / 2;
        let rms = |s: &[f32]| (s.iter().map(|&x| (x as f64).powi(2)).sum::<f64>() / s.len() as f64).sqrt();
        let gain_db = 20.0 * (rms(&output[tail..]) / rms(&input[tail..])).log10();
        assert_relative_eq!(gain_db, 24.0, epsilon = 0.5);
    }

    #[test]
    fn test_nan_input_does_not_poison_state() {
        let mut section = BiquadSection::new();
        section.set_coefficients(BiquadCoeffs::low_pass(48000.0, 1000.0, 0.7));
        let mut block = [f32::NAN, 0.0];
        section.process(&mut block);

        let mut next = [0.0; 8];
        section.process(&mut next);
        assert!(next.iter().all(|s| s.is_finite()));
    }
}

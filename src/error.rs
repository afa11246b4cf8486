//! Error types.
//!
//! Nothing here is ever produced on the audio thread; these surface at setup
//! time (layout negotiation, `prepare`) or from the coefficient designer,
//! whose failures the processor absorbs by keeping its previous filters.

use thiserror::Error;

/// Coefficient designer contract violations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DesignError {
    #[error("sample rate {0} Hz is not usable for filter design")]
    InvalidSampleRate(f64),
    #[error("frequency {freq} Hz is outside (0, {nyquist}) Hz")]
    FrequencyOutOfRange { freq: f64, nyquist: f64 },
    #[error("quality factor {0} must be positive")]
    InvalidQuality(f64),
    #[error("gain {0} is not a finite positive amplitude")]
    InvalidGain(f64),
}

/// Setup-time errors reported to the host before processing starts.
#[derive(Debug, Error)]
pub enum EqError {
    #[error("unsupported channel layout: {inputs} in / {outputs} out (mono or stereo, matching)")]
    UnsupportedLayout { inputs: usize, outputs: usize },
    #[error("invalid sample rate: {0} Hz")]
    InvalidSampleRate(f64),
    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),
    #[error(transparent)]
    Design(#[from] DesignError),
    #[error("failed to decode state: {0}")]
    State(#[from] serde_json::Error),
}

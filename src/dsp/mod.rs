//! DSP module
//!
//! Filter design and the per-channel filter chains, plus the parameter
//! store that feeds them.

pub mod biquad;
pub mod chain;
pub mod context;
pub mod design;
pub mod parameter;
pub mod settings;

pub use biquad::{BiquadCoeffs, BiquadSection, BiquadState};
pub use chain::{update_cut_filter, CutFilter, MonoChain};
pub use context::ProcessSpec;
pub use design::{design, make_high_cut_filter, make_low_cut_filter, make_peak_filter, ChainCoefficients, CutCoefficients};
pub use parameter::{AtomicF32, ParameterDefinition, ParameterDisplay, ParameterId, ParameterStore};
pub use settings::{ChainPosition, ChainSettings, Slope};

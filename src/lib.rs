//! Sound Wizard Library
//!
//! A three-stage parametric equalizer (low cut, peak, high cut) with a live
//! spectrum analyzer of its output.

pub mod analysis;
pub mod app;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod widgets;

//! Widgets module
//!
//! Custom drawing and parameter controls for the equalizer window.

pub mod param_slider;
pub mod response_display;

pub use param_slider::param_slider;
pub use response_display::{response_display, ResponseDisplayConfig};

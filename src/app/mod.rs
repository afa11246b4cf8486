//! Application module
//!
//! Contains the main egui application and theme definitions.

pub mod eq_app;
pub mod theme;

pub use eq_app::{AppOptions, EqApp};

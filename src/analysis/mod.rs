//! Analysis module
//!
//! Non-real-time side: rolling window, FFT, analyzer paths and the filter
//! response curve drawn on top of them.

pub mod analyzer;
pub mod config;
pub mod fft;
pub mod path;
pub mod response;
pub mod rolling;
pub mod scale;

pub use analyzer::{AnalysisTarget, AnalysisThread, SpectrumAnalyzer};
pub use config::{AnalyzerConfig, FftOrder};
pub use fft::FftDataGenerator;
pub use path::{AnalyzerPathGenerator, PathReceiver};
pub use response::{ResponseConfig, ResponseCurve};
pub use rolling::RollingBuffer;

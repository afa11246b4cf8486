//! Output stream host
//!
//! Opens the default cpal output device and runs the equalizer inside its
//! callback. The processor and the test source are moved into the closure;
//! the UI talks to them only through atomics and the analysis taps.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, Device, OutputCallbackInfo, Stream, StreamConfig};
use thiserror::Error;

use crate::dsp::context::ProcessSpec;
use crate::error::EqError;

use super::processor::EqProcessor;
use super::test_signal::TestSignal;

/// Largest callback the processor is prepared for. Longer callbacks are
/// split into chunks of this many frames.
pub const MAX_CALLBACK_FRAMES: usize = 4096;

/// Failures opening or driving the output stream.
#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no output device available")]
    NoDevice,
    #[error("output device has no usable default format: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error("could not build the output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("could not start playback: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("could not pause playback: {0}")]
    Pause(#[from] cpal::PauseStreamError),
    #[error("equalizer rejected the stream: {0}")]
    Processor(#[from] EqError),
}

/// The output device and, while audio runs, its stream.
pub struct AudioEngine {
    device: Device,
    config: StreamConfig,
    stream: Option<Stream>,
}

impl AudioEngine {
    /// Opens the host's default output device at its default format.
    pub fn new() -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let supported = device.default_output_config()?;
        let config = StreamConfig {
            channels: supported.channels(),
            sample_rate: supported.sample_rate(),
            buffer_size: BufferSize::Default,
        };

        let engine = Self {
            device,
            config,
            stream: None,
        };
        log::info!(
            "Output device '{}': {} Hz, {} channel(s)",
            engine.current_device_name(),
            engine.sample_rate(),
            engine.channels()
        );
        Ok(engine)
    }

    pub fn current_device_name(&self) -> String {
        self.device.name().unwrap_or_else(|_| String::from("<unnamed>"))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> u16 {
        self.config.channels
    }

    /// The setup a processor must be prepared with for this device.
    pub fn process_spec(&self) -> ProcessSpec {
        ProcessSpec::new(self.sample_rate() as f64, MAX_CALLBACK_FRAMES)
            .with_channels((self.channels() as usize).min(2))
    }

    /// Prepares `processor` for the device and starts the stream.
    ///
    /// Only the first two device channels are equalized; any further
    /// channels are silenced. Does nothing if a stream is already running.
    pub fn start(&mut self, mut processor: EqProcessor, mut signal: TestSignal) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }

        let spec = self.process_spec();
        processor.prepare(spec)?;
        signal.set_sample_rate(spec.sample_rate as f32);

        let channels = self.config.channels as usize;
        let callback = move |data: &mut [f32], _: &OutputCallbackInfo| {
            // REAL-TIME SAFE: everything below works on preallocated buffers
            signal.fill_interleaved(data, channels);
            processor.process_interleaved(data, channels);
            if channels > 2 {
                data.chunks_mut(channels).for_each(|frame| frame[2..].fill(0.0));
            }
        };
        let on_error = |err: cpal::StreamError| log::error!("Output stream error: {}", err);

        let stream = self
            .device
            .build_output_stream(&self.config, callback, on_error, None)?;
        stream.play()?;

        log::info!("Equalizer running on '{}'", self.current_device_name());
        self.stream = Some(stream);
        Ok(())
    }

    /// Pauses and drops the stream, and the processor inside it.
    pub fn stop(&mut self) -> Result<(), AudioError> {
        let Some(stream) = self.stream.take() else {
            return Ok(());
        };
        stream.pause()?;
        log::info!("Equalizer stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(AudioError::NoDevice.to_string(), "no output device available");

        let err: AudioError = EqError::InvalidSampleRate(0.0).into();
        assert!(matches!(err, AudioError::Processor(_)));
        assert!(err.to_string().contains("invalid sample rate"));
    }

    // Opening a stream needs real audio hardware; start/stop is exercised by
    // running the binary.
}

//! Test signal source for the standalone host.
//!
//! The output device has no input to equalize, so the callback synthesizes
//! a sine or white noise, then runs it through the processor.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::dsp::parameter::AtomicF32;
use crate::dsp::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};

/// What the test source is producing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum SignalKind {
    Silence,
    #[default]
    Sine,
    Noise,
}

impl SignalKind {
    pub const ALL: [SignalKind; 3] = [SignalKind::Silence, SignalKind::Sine, SignalKind::Noise];

    pub fn label(self) -> &'static str {
        match self {
            SignalKind::Silence => "Silence",
            SignalKind::Sine => "Sine",
            SignalKind::Noise => "Noise",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => SignalKind::Sine,
            2 => SignalKind::Noise,
            _ => SignalKind::Silence,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            SignalKind::Silence => 0,
            SignalKind::Sine => 1,
            SignalKind::Noise => 2,
        }
    }
}

pub const DEFAULT_TONE_HZ: f32 = 440.0;

/// Settings the UI changes while the stream runs.
#[derive(Debug)]
pub struct SignalControl {
    kind: AtomicU8,
    tone_hz: AtomicF32,
    level: AtomicF32,
}

impl SignalControl {
    pub fn new(kind: SignalKind, tone_hz: f32) -> Self {
        let control = Self {
            kind: AtomicU8::new(kind.as_u8()),
            tone_hz: AtomicF32::new(DEFAULT_TONE_HZ),
            level: AtomicF32::new(0.25),
        };
        control.set_tone_hz(tone_hz);
        control
    }

    pub fn kind(&self) -> SignalKind {
        SignalKind::from_u8(self.kind.load(Ordering::Relaxed))
    }

    pub fn set_kind(&self, kind: SignalKind) {
        self.kind.store(kind.as_u8(), Ordering::Relaxed);
    }

    pub fn tone_hz(&self) -> f32 {
        self.tone_hz.get()
    }

    /// Clamped to 20 Hz..20 kHz. Non-finite values are ignored.
    pub fn set_tone_hz(&self, hz: f32) {
        if hz.is_finite() {
            self.tone_hz.set(hz.clamp(MIN_FREQUENCY_HZ, MAX_FREQUENCY_HZ));
        }
    }

    pub fn level(&self) -> f32 {
        self.level.get()
    }

    /// Output level, linear 0..1.
    pub fn set_level(&self, level: f32) {
        self.level.set(level.clamp(0.0, 1.0));
    }
}

impl Default for SignalControl {
    fn default() -> Self {
        Self::new(SignalKind::Sine, DEFAULT_TONE_HZ)
    }
}

/// Audio-thread generator driven by a shared [`SignalControl`].
pub struct TestSignal {
    control: Arc<SignalControl>,
    sample_rate: f32,
    /// Normalized phase, 0..1.
    phase: f32,
    rng: SmallRng,
}

impl TestSignal {
    pub fn new(control: Arc<SignalControl>, sample_rate: f32) -> Self {
        Self {
            control,
            sample_rate,
            phase: 0.0,
            rng: SmallRng::seed_from_u64(0x5EED),
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.phase = 0.0;
    }

    /// Writes one block into an interleaved buffer, the same sample on every channel.
    ///
    /// REAL-TIME SAFE: no allocation, no locks.
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let level = self.control.level();
        let kind = self.control.kind();
        let increment = self.control.tone_hz() / self.sample_rate;

        for frame in data.chunks_mut(channels) {
            let sample = match kind {
                SignalKind::Silence => 0.0,
                SignalKind::Sine => {
                    let value = (self.phase * std::f32::consts::TAU).sin();
                    self.phase += increment;
                    if self.phase >= 1.0 {
                        self.phase -= 1.0;
                    }
                    value
                }
                SignalKind::Noise => self.rng.gen_range(-1.0..1.0),
            };
            frame.fill(sample * level);
        }
    }
}

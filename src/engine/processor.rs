//! Equalizer Processor
//!
//! Runs in the audio callback. Once per block it snapshots the parameter
//! store, designs coefficients, loads them into both channel chains, filters
//! the audio in place and mirrors the result into the analysis taps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::dsp::chain::MonoChain;
use crate::dsp::context::ProcessSpec;
use crate::dsp::design::design;
use crate::dsp::parameter::ParameterStore;
use crate::error::EqError;

use super::channel_queue::{channel_sample_queue, ChannelSampleQueue, ChannelSampleReceiver};

/// Counters the audio thread exposes instead of logging.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    skipped_updates: AtomicU64,
    blocks_processed: AtomicU64,
}

impl ProcessorStats {
    /// Blocks whose coefficient update was abandoned because design failed.
    pub fn skipped_updates(&self) -> u64 {
        self.skipped_updates.load(Ordering::Relaxed)
    }

    pub fn blocks_processed(&self) -> u64 {
        self.blocks_processed.load(Ordering::Relaxed)
    }
}

/// Consumer ends of the per-channel analysis taps.
pub struct SampleTaps {
    pub left: ChannelSampleReceiver,
    pub right: ChannelSampleReceiver,
}

struct ChannelStrip {
    chain: MonoChain,
    tap: ChannelSampleQueue,
}

/// The real-time half of the equalizer.
///
/// Move this into the audio callback; talk to it through the shared
/// [`ParameterStore`] and the [`SampleTaps`] returned by [`EqProcessor::new`].
pub struct EqProcessor {
    params: Arc<ParameterStore>,
    spec: ProcessSpec,
    prepared: bool,
    strips: [ChannelStrip; 2],
    /// Planar scratch for interleaved hosts, sized in `prepare`.
    scratch: [Vec<f32>; 2],
    stats: Arc<ProcessorStats>,
}

impl EqProcessor {
    /// Creates an unprepared processor and the analysis taps it feeds.
    ///
    /// # Arguments
    /// * `params` - Shared parameter store written by the UI
    /// * `tap_block_size` - Samples per block shipped to the analyzer
    /// * `tap_capacity` - Blocks each tap can hold before dropping
    pub fn new(params: Arc<ParameterStore>, tap_block_size: usize, tap_capacity: usize) -> (Self, SampleTaps) {
        let (left_tap, left) = channel_sample_queue(tap_block_size, tap_capacity);
        let (right_tap, right) = channel_sample_queue(tap_block_size, tap_capacity);

        let processor = Self {
            params,
            spec: ProcessSpec::default(),
            prepared: false,
            strips: [
                ChannelStrip {
                    chain: MonoChain::new(),
                    tap: left_tap,
                },
                ChannelStrip {
                    chain: MonoChain::new(),
                    tap: right_tap,
                },
            ],
            scratch: Default::default(),
            stats: Arc::new(ProcessorStats::default()),
        };

        (processor, SampleTaps { left, right })
    }

    /// Mono or stereo, with matching input and output counts.
    pub fn is_layout_supported(inputs: usize, outputs: usize) -> bool {
        inputs == outputs && (1..=2).contains(&outputs)
    }

    /// Allocates everything processing needs and loads initial coefficients.
    ///
    /// Must be called before the first `process`; calling it again (e.g. after a
    /// sample-rate change) clears all filter history.
    pub fn prepare(&mut self, spec: ProcessSpec) -> Result<(), EqError> {
        spec.validate()?;

        self.spec = spec;
        for scratch in &mut self.scratch {
            scratch.clear();
            scratch.resize(spec.max_block_size, 0.0);
        }
        for strip in &mut self.strips {
            strip.chain.reset();
            strip.tap.reset();
        }

        if !self.update_filters() {
            log::warn!(
                "Could not design filters at {} Hz; processing with previous coefficients",
                spec.sample_rate
            );
        }

        self.prepared = true;
        log::info!(
            "Equalizer prepared: {} Hz, {} channel(s), max block {}",
            spec.sample_rate,
            spec.num_channels,
            spec.max_block_size
        );
        Ok(())
    }

    /// Shared counters, readable from any thread.
    pub fn stats(&self) -> Arc<ProcessorStats> {
        Arc::clone(&self.stats)
    }

    pub fn spec(&self) -> &ProcessSpec {
        &self.spec
    }

    pub fn left_chain(&self) -> &MonoChain {
        &self.strips[0].chain
    }

    pub fn right_chain(&self) -> &MonoChain {
        &self.strips[1].chain
    }

    /// Processes planar channels in place.
    ///
    /// REAL-TIME SAFE: no locks, no allocation. Channels beyond the second
    /// are left untouched.
    pub fn process(&mut self, channels: &mut [&mut [f32]]) {
        if !self.prepared {
            return;
        }
        self.update_filters();
        self.process_block(channels);
        self.stats.blocks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Processes an interleaved buffer in place.
    ///
    /// REAL-TIME SAFE: deinterleaves through the scratch buffers allocated in
    /// `prepare`, in chunks of at most `max_block_size` frames.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if !self.prepared || channels == 0 {
            return;
        }
        self.update_filters();

        let used = channels.min(2);
        let frames = data.len() / channels;
        let chunk_frames = self.spec.max_block_size;

        // Taking the Vecs out leaves empty ones behind; nothing is allocated.
        let mut scratch = std::mem::take(&mut self.scratch);
        let mut start = 0;
        while start < frames {
            let len = (frames - start).min(chunk_frames);
            let chunk = &mut data[start * channels..(start + len) * channels];

            for (ch, buffer) in scratch.iter_mut().enumerate().take(used) {
                for (sample, frame) in buffer[..len].iter_mut().zip(chunk.chunks_exact(channels)) {
                    *sample = frame[ch];
                }
            }

            {
                let [left, right] = &mut scratch;
                let mut planar: [&mut [f32]; 2] = [&mut left[..len], &mut right[..len]];
                self.process_block(&mut planar[..used]);
            }

            for (ch, buffer) in scratch.iter().enumerate().take(used) {
                for (sample, frame) in buffer[..len].iter().zip(chunk.chunks_exact_mut(channels)) {
                    frame[ch] = *sample;
                }
            }

            start += len;
        }
        self.scratch = scratch;
        self.stats.blocks_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Clears filter history and any partially collected tap block.
    pub fn reset(&mut self) {
        for strip in &mut self.strips {
            strip.chain.reset();
            strip.tap.reset();
        }
    }

    /// Snapshot, design, apply. Returns false if the update was skipped.
    fn update_filters(&mut self) -> bool {
        let sample_rate = self.spec.sample_rate;
        let settings = self.params.chain_settings().clamped_for(sample_rate);

        match design(&settings, sample_rate) {
            Ok(coefficients) => {
                for strip in &mut self.strips {
                    strip
                        .chain
                        .apply(&coefficients, settings.low_cut_slope, settings.high_cut_slope);
                }
                true
            }
            Err(_) => {
                self.stats.skipped_updates.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    fn process_block(&mut self, channels: &mut [&mut [f32]]) {
        for (strip, channel) in self.strips.iter_mut().zip(channels.iter_mut()) {
            strip.chain.process(channel);
            strip.tap.update(channel);
        }
    }
}

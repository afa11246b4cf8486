//! Windowed FFT producing decibel frames for rendering.

use std::f32::consts::PI;
use std::sync::Arc;

use realfft::{RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;

use super::config::FftOrder;
use super::scale::gain_to_decibels;
use crate::engine::queue::{QueueConsumer, QueueProducer, SampleQueue};

/// Four-term Blackman-Harris window, scaled so its mean is 1.
///
/// With that scaling a full-scale sine reads 0 dB after the magnitude is
/// divided by `size / 2`.
pub fn blackman_harris(size: usize) -> Vec<f32> {
    if size < 2 {
        return vec![1.0; size];
    }
    let denom = (size - 1) as f32;
    let mut window: Vec<f32> = (0..size)
        .map(|i| {
            let phase = i as f32 / denom;
            0.35875 - 0.48829 * (2.0 * PI * phase).cos() + 0.14128 * (4.0 * PI * phase).cos()
                - 0.01168 * (6.0 * PI * phase).cos()
        })
        .collect();

    let sum: f32 = window.iter().sum();
    if sum > 0.0 {
        let scale = size as f32 / sum;
        window.iter_mut().for_each(|w| *w *= scale);
    }
    window
}

/// Turns rolling-buffer snapshots into magnitude spectra in dB.
///
/// Frames are queued internally; read them back with
/// [`get_fft_data`](Self::get_fft_data).
pub struct FftDataGenerator {
    order: FftOrder,
    fft: Arc<dyn RealToComplex<f32>>,
    window: Vec<f32>,
    input: Vec<f32>,
    spectrum: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    frame: Vec<f32>,
    producer: QueueProducer<Vec<f32>>,
    consumer: QueueConsumer<Vec<f32>>,
    capacity: usize,
}

impl FftDataGenerator {
    pub fn new(order: FftOrder, capacity: usize) -> Self {
        let size = order.size();
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let input = fft.make_input_vec();
        let spectrum = fft.make_output_vec();
        let scratch = fft.make_scratch_vec();
        let (producer, consumer) = SampleQueue::new(capacity, || vec![0.0_f32; size / 2]);

        Self {
            order,
            fft,
            window: blackman_harris(size),
            input,
            spectrum,
            scratch,
            frame: vec![0.0; size / 2],
            producer,
            consumer,
            capacity,
        }
    }

    /// Replans for a different FFT size. Queued frames are discarded.
    pub fn change_order(&mut self, order: FftOrder) {
        if order != self.order {
            *self = Self::new(order, self.capacity);
        }
    }

    pub fn order(&self) -> FftOrder {
        self.order
    }

    pub fn fft_size(&self) -> usize {
        self.order.size()
    }

    /// Windows `audio`, transforms it and queues one frame of
    /// `fft_size / 2` decibel values, each at least `floor_db`.
    ///
    /// `audio` shorter than the FFT is zero-padded; longer is truncated.
    /// Returns false if the frame could not be produced or queued.
    pub fn produce_fft_data_for_rendering(&mut self, audio: &[f32], floor_db: f32) -> bool {
        let size = self.fft_size();
        let copied = audio.len().min(size);
        self.input[..copied].copy_from_slice(&audio[..copied]);
        self.input[copied..].fill(0.0);

        for (sample, w) in self.input.iter_mut().zip(&self.window) {
            *sample *= w;
        }

        if self
            .fft
            .process_with_scratch(&mut self.input, &mut self.spectrum, &mut self.scratch)
            .is_err()
        {
            return false;
        }

        let num_bins = size / 2;
        let norm = num_bins as f32;
        for (out, bin) in self.frame.iter_mut().zip(&self.spectrum[..num_bins]) {
            let magnitude = bin.norm() / norm;
            let magnitude = if magnitude.is_finite() { magnitude } else { 0.0 };
            *out = gain_to_decibels(magnitude, floor_db);
        }

        self.producer.push(&self.frame)
    }

    pub fn num_available_fft_data_blocks(&self) -> usize {
        self.consumer.num_available()
    }

    /// Copies the oldest queued frame into `frame`.
    pub fn get_fft_data(&mut self, frame: &mut Vec<f32>) -> bool {
        self.consumer.pull(frame)
    }
}

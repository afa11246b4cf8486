//! Magnitude spectra to screen-space polylines.

use eframe::egui::{Pos2, Rect};

use super::scale::{jmap, map_to_log10};
use crate::dsp::settings::{MAX_FREQUENCY_HZ, MIN_FREQUENCY_HZ};
use crate::engine::queue::{QueueConsumer, QueueProducer, SampleQueue};

/// Largest path a slot is sized for up front (half of the biggest FFT).
const PREALLOCATED_POINTS: usize = 4096;

/// Builds analyzer paths and publishes them for the UI.
pub struct AnalyzerPathGenerator {
    path: Vec<Pos2>,
    producer: QueueProducer<Vec<Pos2>>,
    resolution: usize,
    min_freq: f32,
    max_freq: f32,
}

impl AnalyzerPathGenerator {
    /// Creates a generator publishing into a queue of `capacity` paths.
    pub fn new(capacity: usize) -> (Self, PathReceiver) {
        let (producer, consumer) = SampleQueue::new(capacity, || Vec::with_capacity(PREALLOCATED_POINTS));
        (
            Self {
                path: Vec::with_capacity(PREALLOCATED_POINTS),
                producer,
                resolution: 2,
                min_freq: MIN_FREQUENCY_HZ,
                max_freq: MAX_FREQUENCY_HZ,
            },
            PathReceiver { consumer },
        )
    }

    /// Use every `resolution`-th bin.
    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.resolution = resolution.max(1);
        self
    }

    /// Frequency span of the x axis.
    pub fn with_freq_range(mut self, min: f32, max: f32) -> Self {
        self.min_freq = min;
        self.max_freq = max;
        self
    }

    /// Converts one decibel frame into a path inside `bounds` and queues it.
    ///
    /// # Arguments
    /// * `render_data` - `fft_size / 2` magnitudes in dB
    /// * `bounds` - Target rectangle in screen space
    /// * `fft_size` - Transform length the frame came from
    /// * `bin_width` - Hz per bin (`sample_rate / fft_size`)
    /// * `floor_db` - Level drawn at the bottom edge
    ///
    /// Returns false if the path queue was full.
    pub fn generate_path(
        &mut self,
        render_data: &[f32],
        bounds: Rect,
        fft_size: usize,
        bin_width: f32,
        floor_db: f32,
    ) -> bool {
        build_path(
            &mut self.path,
            render_data,
            bounds,
            fft_size,
            bin_width,
            floor_db,
            self.resolution,
            (self.min_freq, self.max_freq),
        );
        self.producer.push(&self.path)
    }

    /// The path most recently generated.
    pub fn last_path(&self) -> &[Pos2] {
        &self.path
    }
}

#[allow(clippy::too_many_arguments)]
fn build_path(
    path: &mut Vec<Pos2>,
    render_data: &[f32],
    bounds: Rect,
    fft_size: usize,
    bin_width: f32,
    floor_db: f32,
    resolution: usize,
    (min_freq, max_freq): (f32, f32),
) {
    path.clear();
    let num_bins = (fft_size / 2).min(render_data.len());
    if num_bins == 0 || bounds.width() <= 0.0 {
        return;
    }

    let y_for = |db: f32| {
        let y = jmap(db, floor_db, 0.0, bounds.bottom(), bounds.top());
        if y.is_finite() {
            y
        } else {
            bounds.bottom()
        }
    };

    path.push(Pos2::new(bounds.left(), y_for(render_data[0])));

    for bin in (1..num_bins).step_by(resolution.max(1)) {
        let freq = (bin as f32 * bin_width).max(min_freq);
        if freq > max_freq {
            break;
        }
        let x = bounds.left() + map_to_log10(freq, min_freq, max_freq) * bounds.width();
        path.push(Pos2::new(x, y_for(render_data[bin])));
    }
}

/// UI-side reader for analyzer paths.
pub struct PathReceiver {
    consumer: QueueConsumer<Vec<Pos2>>,
}

impl PathReceiver {
    pub fn has_new_path(&self) -> bool {
        self.consumer.num_available() > 0
    }

    /// Drains every queued path into `path`, leaving the newest.
    ///
    /// Returns false and leaves `path` alone when nothing new arrived.
    pub fn latest_path(&mut self, path: &mut Vec<Pos2>) -> bool {
        self.consumer.pull_latest(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use eframe::egui::vec2;

    fn bounds() -> Rect {
        Rect::from_min_size(Pos2::new(10.0, 20.0), vec2(300.0, 100.0))
    }

    #[test]
    fn test_floor_maps_to_bottom_and_zero_db_to_top() {
        let (mut generator, mut receiver) = AnalyzerPathGenerator::new(4);
        let mut data = vec![-48.0_f32; 1024];
        data[0] = 0.0;
        assert!(generator.generate_path(&data, bounds(), 2048, 48000.0 / 2048.0, -48.0));

        let mut path = Vec::new();
        assert!(receiver.latest_path(&mut path));
        assert_eq!(path[0], Pos2::new(10.0, 20.0));
        assert!(path[1..].iter().all(|p| p.y == 120.0));
    }

    #[test]
    fn test_path_stays_inside_horizontal_bounds() {
        let (mut generator, _receiver) = AnalyzerPathGenerator::new(4);
        let data = vec![-20.0_f32; 1024];
        generator.generate_path(&data, bounds(), 2048, 48000.0 / 2048.0, -48.0);

        let path = generator.last_path();
        assert!(path.len() > 10);
        assert!(path.iter().all(|p| p.x >= 10.0 && p.x <= 310.0 + 1e-3));
        assert!(path.windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn test_bins_above_max_frequency_are_dropped() {
        let (mut generator, _receiver) = AnalyzerPathGenerator::new(4);
        let bin_width = 48000.0 / 2048.0;
        let data = vec![-10.0_f32; 1024];
        generator.generate_path(&data, bounds(), 2048, bin_width, -48.0);

        // Bins 1, 3, 5, ... up to 20 kHz, plus the DC point.
        let last_bin = (20000.0 / bin_width) as usize;
        let expected = 1 + (1..=last_bin).step_by(2).count();
        assert_eq!(generator.last_path().len(), expected);
    }

    #[test]
    fn test_low_bins_are_floored_at_min_frequency() {
        let (generator, _receiver) = AnalyzerPathGenerator::new(4);
        let mut generator = generator.with_resolution(1);
        let data = vec![-10.0_f32; 64];
        // 1 Hz bins: bins 1..20 all sit on the left edge.
        generator.generate_path(&data, bounds(), 128, 1.0, -48.0);
        let path = generator.last_path();
        assert!(path[1..20].iter().all(|p| p.x == 10.0));
        assert!(path[21].x > 10.0);
    }

    #[test]
    fn test_non_finite_levels_draw_at_bottom() {
        let (mut generator, _receiver) = AnalyzerPathGenerator::new(4);
        let mut data = vec![-10.0_f32; 1024];
        data[3] = f32::NAN;
        generator.generate_path(&data, bounds(), 2048, 48000.0 / 2048.0, -48.0);
        assert!(generator.last_path().iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        assert_eq!(generator.last_path()[2].y, 120.0);
    }

    #[test]
    fn test_receiver_keeps_latest() {
        let (mut generator, mut receiver) = AnalyzerPathGenerator::new(4);
        assert!(!receiver.has_new_path());

        let quiet = vec![-40.0_f32; 16];
        let loud = vec![-5.0_f32; 16];
        generator.generate_path(&quiet, bounds(), 32, 1000.0, -48.0);
        generator.generate_path(&loud, bounds(), 32, 1000.0, -48.0);
        assert!(receiver.has_new_path());

        let mut path = Vec::new();
        assert!(receiver.latest_path(&mut path));
        assert!(!receiver.has_new_path());
        let expected_y = jmap(-5.0, -48.0, 0.0, 120.0, 20.0);
        assert_relative_eq!(path[1].y, expected_y);
        assert!(!receiver.latest_path(&mut path));
    }
}

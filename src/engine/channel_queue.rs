//! Per-channel sample taps.
//!
//! The audio thread feeds arbitrary host blocks into a `ChannelSampleQueue`,
//! which cuts them into fixed-size analysis blocks and pushes those onto a
//! [`SampleQueue`]. The analysis side reads them back through a
//! `ChannelSampleReceiver`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::queue::{QueueConsumer, QueueProducer, SampleQueue};

/// Creates a connected producer/receiver pair for one channel.
pub fn channel_sample_queue(block_size: usize, capacity: usize) -> (ChannelSampleQueue, ChannelSampleReceiver) {
    let block_size = block_size.max(1);
    let (producer, consumer) = SampleQueue::new(capacity, || vec![0.0_f32; block_size]);
    let dropped = Arc::new(AtomicU64::new(0));

    (
        ChannelSampleQueue {
            producer,
            block: vec![0.0; block_size],
            fill: 0,
            dropped: Arc::clone(&dropped),
        },
        ChannelSampleReceiver {
            consumer,
            block_size,
            dropped,
        },
    )
}

/// Audio-thread half: accumulates samples into complete blocks.
///
/// REAL-TIME SAFE: `update` copies into a preallocated block.
pub struct ChannelSampleQueue {
    producer: QueueProducer<Vec<f32>>,
    block: Vec<f32>,
    fill: usize,
    dropped: Arc<AtomicU64>,
}

impl ChannelSampleQueue {
    /// Appends `samples`, pushing every block that fills up.
    ///
    /// A block that finds the queue full is dropped and counted.
    pub fn update(&mut self, samples: &[f32]) {
        let mut remaining = samples;
        while !remaining.is_empty() {
            let take = (self.block.len() - self.fill).min(remaining.len());
            self.block[self.fill..self.fill + take].copy_from_slice(&remaining[..take]);
            self.fill += take;
            remaining = &remaining[take..];

            if self.fill == self.block.len() {
                if !self.producer.push(&self.block) {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                self.fill = 0;
            }
        }
    }

    /// Discards a partially filled block.
    pub fn reset(&mut self) {
        self.fill = 0;
    }

    pub fn block_size(&self) -> usize {
        self.block.len()
    }
}

/// Analysis-side half.
pub struct ChannelSampleReceiver {
    consumer: QueueConsumer<Vec<f32>>,
    block_size: usize,
    dropped: Arc<AtomicU64>,
}

impl ChannelSampleReceiver {
    /// Number of complete blocks waiting to be read.
    pub fn num_complete_buffers_available(&self) -> usize {
        self.consumer.num_available()
    }

    /// Moves the oldest complete block into `buffer`.
    pub fn get_audio_buffer(&mut self, buffer: &mut Vec<f32>) -> bool {
        self.consumer.pull(buffer)
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Blocks the audio thread had to throw away because this side fell behind.
    pub fn dropped_blocks(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_blocks_are_held_back() {
        let (mut tap, receiver) = channel_sample_queue(8, 4);
        tap.update(&[1.0; 5]);
        assert_eq!(receiver.num_complete_buffers_available(), 0);
        tap.update(&[1.0; 3]);
        assert_eq!(receiver.num_complete_buffers_available(), 1);
    }

    #[test]
    fn test_blocks_split_across_updates() {
        let (mut tap, mut receiver) = channel_sample_queue(4, 4);
        let samples: Vec<f32> = (0..10).map(|i| i as f32).collect();
        tap.update(&samples[..3]);
        tap.update(&samples[3..]);

        let mut block = Vec::new();
        assert!(receiver.get_audio_buffer(&mut block));
        assert_eq!(block, vec![0.0, 1.0, 2.0, 3.0]);
        assert!(receiver.get_audio_buffer(&mut block));
        assert_eq!(block, vec![4.0, 5.0, 6.0, 7.0]);
        assert!(!receiver.get_audio_buffer(&mut block));
    }

    #[test]
    fn test_full_queue_counts_dropped_blocks() {
        let (mut tap, receiver) = channel_sample_queue(2, 2);
        tap.update(&[0.5; 10]);
        assert_eq!(receiver.num_complete_buffers_available(), 2);
        assert_eq!(receiver.dropped_blocks(), 3);
    }

    #[test]
    fn test_reset_discards_partial_block() {
        let (mut tap, mut receiver) = channel_sample_queue(4, 4);
        tap.update(&[9.0; 3]);
        tap.reset();
        tap.update(&[1.0; 4]);

        let mut block = Vec::new();
        assert!(receiver.get_audio_buffer(&mut block));
        assert_eq!(block, vec![1.0; 4]);
        assert_eq!(tap.block_size(), 4);
        assert_eq!(receiver.block_size(), 4);
    }
}

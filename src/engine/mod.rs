//! Engine module
//!
//! Real-time side of the equalizer: the per-block processor, the lock-free
//! queues that carry processed audio to the analyzer, and the cpal host.

pub mod audio_engine;
pub mod channel_queue;
pub mod processor;
pub mod queue;
pub mod test_signal;

pub use audio_engine::{AudioEngine, AudioError, MAX_CALLBACK_FRAMES};
pub use channel_queue::{channel_sample_queue, ChannelSampleQueue, ChannelSampleReceiver};
pub use processor::{EqProcessor, ProcessorStats, SampleTaps};
pub use queue::{QueueConsumer, QueueProducer, SampleQueue, DEFAULT_QUEUE_CAPACITY};
pub use test_signal::{SignalControl, SignalKind, TestSignal};

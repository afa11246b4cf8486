//! Sample Queue
//!
//! Lock-free single-producer, single-consumer queue of preallocated slots.
//! Two rtrb rings back it: the *ready* ring carries filled slots to the
//! consumer, the *free* ring hands emptied slots back to the producer. Items
//! are copied in and out with `clone_from`, so once every slot has been
//! sized, neither side allocates.

use rtrb::{Consumer, Producer, RingBuffer};

/// Default number of slots, enough for a few frames of display lag.
pub const DEFAULT_QUEUE_CAPACITY: usize = 30;

/// Constructor namespace for a slot queue.
pub struct SampleQueue;

impl SampleQueue {
    /// Creates a queue of `capacity` slots, each built by `make_slot`.
    ///
    /// `make_slot` should return a value already sized like the items that
    /// will be pushed (e.g. `vec![0.0; block_size]`).
    pub fn new<T, F>(capacity: usize, mut make_slot: F) -> (QueueProducer<T>, QueueConsumer<T>)
    where
        F: FnMut() -> T,
    {
        let (ready_tx, ready_rx) = RingBuffer::new(capacity);
        let (mut free_tx, free_rx) = RingBuffer::new(capacity);

        for _ in 0..capacity {
            // Cannot fail: the free ring was created with `capacity` slots.
            let _ = free_tx.push(make_slot());
        }

        (
            QueueProducer { ready_tx, free_rx, capacity },
            QueueConsumer { ready_rx, free_tx, capacity },
        )
    }
}

/// Writing half. Lives on the audio thread.
///
/// REAL-TIME SAFE: push never blocks and never allocates once slots are sized.
pub struct QueueProducer<T> {
    ready_tx: Producer<T>,
    free_rx: Consumer<T>,
    capacity: usize,
}

impl<T: Clone> QueueProducer<T> {
    /// Copies `item` into the next free slot and publishes it.
    ///
    /// Returns false, dropping the item, when every slot is waiting to be read.
    pub fn push(&mut self, item: &T) -> bool {
        let Ok(mut slot) = self.free_rx.pop() else {
            return false;
        };
        slot.clone_from(item);
        // Slots in flight never exceed capacity, so the ready ring has room.
        self.ready_tx.push(slot).is_ok()
    }
}

impl<T> QueueProducer<T> {
    /// Number of slots that can be pushed right now.
    pub fn free_slots(&self) -> usize {
        self.free_rx.slots()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Reading half. Lives on the analysis thread.
pub struct QueueConsumer<T> {
    ready_rx: Consumer<T>,
    free_tx: Producer<T>,
    capacity: usize,
}

impl<T: Clone> QueueConsumer<T> {
    /// Copies the oldest published slot into `item` and recycles the slot.
    ///
    /// Returns false and leaves `item` untouched when nothing is available.
    pub fn pull(&mut self, item: &mut T) -> bool {
        let Ok(slot) = self.ready_rx.pop() else {
            return false;
        };
        item.clone_from(&slot);
        let _ = self.free_tx.push(slot);
        true
    }

    /// Drains everything available, keeping only the newest item.
    pub fn pull_latest(&mut self, item: &mut T) -> bool {
        let mut pulled = false;
        while self.pull(item) {
            pulled = true;
        }
        pulled
    }
}

impl<T> QueueConsumer<T> {
    /// Number of published slots waiting to be pulled.
    pub fn num_available(&self) -> usize {
        self.ready_rx.slots()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

//! Rolling mono buffer feeding the FFT.

/// Fixed-length window of the most recent samples, oldest first.
#[derive(Clone, Debug)]
pub struct RollingBuffer {
    samples: Vec<f32>,
}

impl RollingBuffer {
    /// Creates a silent window of `len` samples.
    pub fn new(len: usize) -> Self {
        Self {
            samples: vec![0.0; len],
        }
    }

    /// Shifts the window left by `block.len()` and writes `block` at the tail.
    ///
    /// A block at least as long as the window replaces it with the block's
    /// last `len()` samples.
    pub fn push_block(&mut self, block: &[f32]) {
        let len = self.samples.len();
        if block.len() >= len {
            self.samples.copy_from_slice(&block[block.len() - len..]);
            return;
        }

        let shift = block.len();
        self.samples.copy_within(shift.., 0);
        self.samples[len - shift..].copy_from_slice(block);
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Changes the window length. Contents are cleared.
    pub fn resize(&mut self, len: usize) {
        self.samples.clear();
        self.samples.resize(len, 0.0);
    }

    pub fn clear(&mut self) {
        self.samples.fill(0.0);
    }
}

//! Bounded playback queue between the capture callback and the output device.

use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free sample queue feeding an output stream.
///
/// The capture side pushes whole blocks; the output callback drains as many
/// samples as the device asks for. Neither side ever blocks: samples that do
/// not fit are dropped, and missing samples are played as silence.
pub struct SampleQueue {
    samples: ArrayQueue<i16>,
    overflows: AtomicU64,
    underruns: AtomicU64,
}

impl SampleQueue {
    /// Create a queue holding up to `capacity` samples (at least one)
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: ArrayQueue::new(capacity.max(1)),
            overflows: AtomicU64::new(0),
            underruns: AtomicU64::new(0),
        }
    }

    /// Queue sized for a number of blocks
    pub fn with_blocks(block_samples: usize, blocks: usize) -> Self {
        Self::new(block_samples.saturating_mul(blocks))
    }

    /// Enqueue a block. Returns false if the tail had to be dropped.
    pub fn push_block(&self, block: &[i16]) -> bool {
        for (written, &sample) in block.iter().enumerate() {
            if self.samples.push(sample).is_err() {
                let dropped = (block.len() - written) as u64;
                self.overflows.fetch_add(dropped, Ordering::Relaxed);
                return false;
            }
        }
        true
    }

    /// Fill `out` from the queue, padding with silence. Returns samples read.
    pub fn fill(&self, out: &mut [i16]) -> usize {
        let mut read = 0;
        for slot in out.iter_mut() {
            match self.samples.pop() {
                Some(sample) => {
                    *slot = sample;
                    read += 1;
                }
                None => *slot = 0,
            }
        }

        if read < out.len() {
            self.underruns.fetch_add(1, Ordering::Relaxed);
        }
        read
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.samples.capacity()
    }

    /// Samples dropped because the queue was full
    pub fn overflows(&self) -> u64 {
        self.overflows.load(Ordering::Relaxed)
    }

    /// Output callbacks that ran short of samples
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> QueueStats {
        QueueStats {
            queued: self.len(),
            capacity: self.capacity(),
            overflows: self.overflows(),
            underruns: self.underruns(),
        }
    }
}

/// Point-in-time counters of a [`SampleQueue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub queued: usize,
    pub capacity: usize,
    pub overflows: u64,
    pub underruns: u64,
}

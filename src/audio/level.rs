//! Loudness estimation and the hand-off of levels to the display.
//!
//! The driver thread computes one level per captured block and publishes it
//! through a [`LevelSink`]. [`LevelCell`] is the default sink: a single
//! atomic slot where the latest value wins, read by the display on its own
//! schedule.

use std::sync::atomic::{AtomicU64, Ordering};

/// Maximum amplitude of a signed 16-bit sample
pub const FULL_SCALE: f64 = 32767.0;

/// Highest level reported to the display
pub const MAX_LEVEL: u8 = 100;

/// Root-mean-square of a block, `None` for an empty block
pub fn rms(block: &[i16]) -> Option<f64> {
    if block.is_empty() {
        return None;
    }

    let sum: f64 = block
        .iter()
        .map(|&sample| {
            let sample = f64::from(sample);
            sample * sample
        })
        .sum();

    Some((sum / block.len() as f64).sqrt())
}

/// Map an RMS amplitude onto [0, 100], truncating
pub fn level_from_rms(rms: f64) -> u8 {
    let scaled = (rms / FULL_SCALE * 100.0).floor();
    scaled.clamp(0.0, f64::from(MAX_LEVEL)) as u8
}

/// Loudness level of a block, `None` for an empty block
pub fn loudness_level(block: &[i16]) -> Option<u8> {
    rms(block).map(level_from_rms)
}

/// Receiver of loudness levels, callable from the audio driver thread
pub trait LevelSink: Send + Sync {
    fn set_level(&self, level: u8);
}

/// A level together with the number of updates published so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelSnapshot {
    pub level: u8,
    pub sequence: u64,
}

/// Single-slot, lock-free "latest value wins" cell.
///
/// The low byte holds the level, the remaining bits a sequence number that
/// increases with every update, so a reader can tell a fresh value from a
/// repeated one.
#[derive(Debug, Default)]
pub struct LevelCell {
    packed: AtomicU64,
}

impl LevelCell {
    pub fn new() -> Self {
        Self::default()
    }

    fn pack(level: u8, sequence: u64) -> u64 {
        (sequence << 8) | u64::from(level)
    }

    fn unpack(packed: u64) -> LevelSnapshot {
        LevelSnapshot {
            level: (packed & 0xff) as u8,
            sequence: packed >> 8,
        }
    }

    /// Most recent level (0 before the first update)
    pub fn latest(&self) -> u8 {
        self.snapshot().level
    }

    pub fn snapshot(&self) -> LevelSnapshot {
        Self::unpack(self.packed.load(Ordering::Acquire))
    }

    /// Return the level if it was published after `seen`, advancing `seen`
    pub fn take_update(&self, seen: &mut u64) -> Option<u8> {
        let snapshot = self.snapshot();
        if snapshot.sequence > *seen {
            *seen = snapshot.sequence;
            Some(snapshot.level)
        } else {
            None
        }
    }
}

impl LevelSink for LevelCell {
    fn set_level(&self, level: u8) {
        let level = level.min(MAX_LEVEL);
        let mut current = self.packed.load(Ordering::Acquire);
        loop {
            let sequence = Self::unpack(current).sequence.wrapping_add(1);
            match self.packed.compare_exchange_weak(
                current,
                Self::pack(level, sequence),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }
}

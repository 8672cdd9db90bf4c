//! Per-chunk progress shared between chunk workers and the renderer.
//!
//! Each slot holds the bit pattern of an `f64` fraction in an `AtomicU64`.
//! A slot has exactly one writer (its chunk worker), so stores never contend
//! and readers never block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Largest `f64` strictly below 1.0.
const BELOW_ONE: f64 = 1.0 - f64::EPSILON / 2.0;

/// Fraction of a chunk that is done. Exactly 1.0 iff `downloaded >= expected`.
pub fn fraction(downloaded: u64, expected: u64) -> f64 {
    if downloaded >= expected {
        return 1.0;
    }
    (downloaded as f64 / expected as f64).min(BELOW_ONE)
}

/// Point-in-time copy of every chunk's fraction, ordered by chunk index.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    fractions: Vec<f64>,
}

impl ProgressSnapshot {
    pub fn fractions(&self) -> &[f64] {
        &self.fractions
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    pub fn is_complete(&self, index: usize) -> bool {
        self.fractions.get(index).copied() == Some(1.0)
    }

    pub fn all_complete(&self) -> bool {
        self.fractions.iter().all(|f| *f == 1.0)
    }

    /// Mean fraction across chunks (chunks are near-equal in size).
    pub fn overall(&self) -> f64 {
        if self.fractions.is_empty() {
            return 0.0;
        }
        self.fractions.iter().sum::<f64>() / self.fractions.len() as f64
    }
}

/// Shared, cheaply clonable progress table with one slot per chunk.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    slots: Arc<[AtomicU64]>,
}

impl ProgressAggregator {
    /// `chunk_count` slots, all at 0.0.
    pub fn new(chunk_count: usize) -> Self {
        let zero = 0.0f64.to_bits();
        Self {
            slots: (0..chunk_count).map(|_| AtomicU64::new(zero)).collect(),
        }
    }

    pub fn chunk_count(&self) -> usize {
        self.slots.len()
    }

    /// Writer handle for chunk `index`. Hand each one to exactly one worker.
    pub fn slot(&self, index: usize) -> ProgressSlot {
        assert!(index < self.slots.len(), "progress slot {index} out of range");
        ProgressSlot {
            slots: Arc::clone(&self.slots),
            index,
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            fractions: self
                .slots
                .iter()
                .map(|s| f64::from_bits(s.load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

/// The single writer of one progress slot.
#[derive(Debug)]
pub struct ProgressSlot {
    slots: Arc<[AtomicU64]>,
    index: usize,
}

impl ProgressSlot {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn record(&self, downloaded: u64, expected: u64) {
        self.slots[self.index].store(fraction(downloaded, expected).to_bits(), Ordering::Relaxed);
    }
}

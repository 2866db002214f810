//! Rolling sample history.
//!
//! Conceptually the history of every sample since stream start; only the
//! trailing lookback window is ever read, so a fixed-capacity ring sized to
//! that window holds it. Once full, each append evicts the oldest chunk.

use crate::error::DenoiseError;
use ringbuf::{Consumer, Producer, RingBuffer};

/// Result of a tail read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum History {
    Complete,
    /// Fewer chunks than requested were available; the tail holds all of them.
    Insufficient {
        available_chunks: usize,
        requested_chunks: usize,
    },
}

impl History {
    #[inline]
    pub fn is_complete(&self) -> bool {
        matches!(self, History::Complete)
    }
}

pub struct SampleBuffer {
    prod: Producer<f32>,
    cons: Consumer<f32>,
    chunk_size: usize,
    capacity_chunks: usize,
    total_appended: u64,
}

impl SampleBuffer {
    pub fn new(chunk_size: usize, capacity_chunks: usize) -> Self {
        assert!(chunk_size > 0 && capacity_chunks > 0);

        let (prod, cons) = RingBuffer::new(chunk_size * capacity_chunks).split();
        Self {
            prod,
            cons,
            chunk_size,
            capacity_chunks,
            total_appended: 0,
        }
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Capacity in samples.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.chunk_size * self.capacity_chunks
    }

    /// Samples currently retained.
    #[inline]
    pub fn len(&self) -> usize {
        self.cons.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cons.is_empty()
    }

    #[inline]
    pub fn retained_chunks(&self) -> usize {
        self.len() / self.chunk_size
    }

    /// Samples appended since creation (or the last clear), including evicted ones.
    #[inline]
    pub fn total_appended(&self) -> u64 {
        self.total_appended
    }

    pub fn append(&mut self, chunk: &[f32]) -> Result<(), DenoiseError> {
        if chunk.len() != self.chunk_size {
            return Err(DenoiseError::LengthMismatch {
                expected: self.chunk_size,
                actual: chunk.len(),
            });
        }

        // Evict the oldest chunk when full.
        let overflow = chunk.len().saturating_sub(self.prod.remaining());
        for _ in 0..overflow {
            let _ = self.cons.pop();
        }

        let pushed = self.prod.push_slice(chunk);
        debug_assert_eq!(pushed, chunk.len());
        self.total_appended += chunk.len() as u64;
        Ok(())
    }

    /// Copy the most recent `n_chunks` chunks into `out` (oldest first).
    pub fn tail_into(&self, n_chunks: usize, out: &mut Vec<f32>) -> History {
        let available = self.len();
        let wanted = n_chunks * self.chunk_size;
        let take = wanted.min(available);

        out.clear();
        out.extend(self.cons.iter().skip(available - take).copied());

        if take == wanted {
            History::Complete
        } else {
            History::Insufficient {
                available_chunks: take / self.chunk_size,
                requested_chunks: n_chunks,
            }
        }
    }

    pub fn clear(&mut self) {
        while self.cons.pop().is_some() {}
        self.total_appended = 0;
    }
}

//! Chunk sources.
//!
//! A source hands out fixed-size mono chunks at a fixed rate, in order. Blocking
//! inside `read_chunk` is the only place a stream is allowed to wait.

use crate::io::pcm::int_to_sample;
use anyhow::{bail, Context};
use hound::{SampleFormat, WavReader};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub trait ChunkSource {
    fn sample_rate(&self) -> u32;

    fn chunk_size(&self) -> usize;

    /// Fill `out` with the next chunk. Returns `Ok(false)` once the source is
    /// exhausted; a final partial chunk is zero-padded to full length.
    fn read_chunk(&mut self, out: &mut [f32]) -> anyhow::Result<bool>;
}

/// In-memory source over a prepared sample vector.
pub struct MemorySource {
    samples: Vec<f32>,
    pos: usize,
    sample_rate: u32,
    chunk_size: usize,
}

impl MemorySource {
    pub fn new(samples: Vec<f32>, sample_rate: u32, chunk_size: usize) -> Self {
        assert!(chunk_size > 0);
        Self {
            samples,
            pos: 0,
            sample_rate,
            chunk_size,
        }
    }

    pub fn remaining(&self) -> usize {
        self.samples.len() - self.pos
    }
}

impl ChunkSource for MemorySource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn read_chunk(&mut self, out: &mut [f32]) -> anyhow::Result<bool> {
        if out.len() != self.chunk_size {
            bail!(
                "chunk buffer holds {} samples, source produces {}",
                out.len(),
                self.chunk_size
            );
        }
        if self.pos >= self.samples.len() {
            return Ok(false);
        }

        let n = self.remaining().min(self.chunk_size);
        out[..n].copy_from_slice(&self.samples[self.pos..self.pos + n]);
        out[n..].fill(0.0);
        self.pos += n;
        Ok(true)
    }
}

/// Mono WAV file read chunk by chunk.
pub struct WavSource {
    reader: WavReader<BufReader<File>>,
    sample_rate: u32,
    bits: u16,
    format: SampleFormat,
    chunk_size: usize,
    padded_samples: usize,
}

impl WavSource {
    pub fn open(path: impl AsRef<Path>, chunk_size: usize) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let reader = WavReader::open(path)
            .with_context(|| format!("failed to open WAV '{}'", path.display()))?;
        let spec = reader.spec();
        if spec.channels != 1 {
            bail!(
                "'{}' has {} channels; only mono input is supported",
                path.display(),
                spec.channels
            );
        }
        if chunk_size == 0 {
            bail!("chunk size must be > 0");
        }

        log::debug!(
            "WavSource '{}': {} Hz, {} bit {:?}, {} samples",
            path.display(),
            spec.sample_rate,
            spec.bits_per_sample,
            spec.sample_format,
            reader.len()
        );

        Ok(Self {
            reader,
            sample_rate: spec.sample_rate,
            bits: spec.bits_per_sample,
            format: spec.sample_format,
            chunk_size,
            padded_samples: 0,
        })
    }

    /// Zeros appended to complete the final chunk.
    pub fn padded_samples(&self) -> usize {
        self.padded_samples
    }
}

impl ChunkSource for WavSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn read_chunk(&mut self, out: &mut [f32]) -> anyhow::Result<bool> {
        if out.len() != self.chunk_size {
            bail!(
                "chunk buffer holds {} samples, source produces {}",
                out.len(),
                self.chunk_size
            );
        }

        let mut n = 0;
        match self.format {
            SampleFormat::Int => {
                let bits = self.bits;
                for s in self.reader.samples::<i32>().take(self.chunk_size) {
                    out[n] = int_to_sample(s.context("corrupt WAV sample")?, bits);
                    n += 1;
                }
            }
            SampleFormat::Float => {
                for s in self.reader.samples::<f32>().take(self.chunk_size) {
                    out[n] = s.context("corrupt WAV sample")?;
                    n += 1;
                }
            }
        }

        if n == 0 {
            return Ok(false);
        }
        if n < self.chunk_size {
            out[n..].fill(0.0);
            self.padded_samples += self.chunk_size - n;
        }
        Ok(true)
    }
}

//! Chunk sinks and end-of-session export.

use crate::io::pcm::sample_to_i16;
use anyhow::Context;
use hound::{SampleFormat, WavSpec, WavWriter};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub trait ChunkSink {
    /// Receive one raw chunk and its denoised counterpart.
    fn accept(&mut self, raw: &[f32], denoised: &[f32]) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// 32-bit IEEE float, samples written as-is.
    #[default]
    Float32,
    /// 16-bit integer PCM, clipped.
    Pcm16,
}

/// Accumulates the raw and denoised streams for a one-shot export.
#[derive(Debug, Clone, Default)]
pub struct SessionRecorder {
    raw: Vec<f32>,
    clean: Vec<f32>,
    sample_rate: u32,
}

impl SessionRecorder {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            raw: Vec::new(),
            clean: Vec::new(),
            sample_rate,
        }
    }

    pub fn raw(&self) -> &[f32] {
        &self.raw
    }

    pub fn clean(&self) -> &[f32] {
        &self.clean
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Recorded duration in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.raw.len() as f64 / self.sample_rate.max(1) as f64
    }

    pub fn clear(&mut self) {
        self.raw.clear();
        self.clean.clear();
    }

    pub fn export(
        &self,
        raw_path: impl AsRef<Path>,
        clean_path: impl AsRef<Path>,
        format: ExportFormat,
    ) -> anyhow::Result<()> {
        write_wav(raw_path.as_ref(), &self.raw, self.sample_rate, format)?;
        write_wav(clean_path.as_ref(), &self.clean, self.sample_rate, format)?;
        log::info!(
            "exported {:.2} s to '{}' and '{}'",
            self.duration_secs(),
            raw_path.as_ref().display(),
            clean_path.as_ref().display()
        );
        Ok(())
    }
}

impl ChunkSink for SessionRecorder {
    fn accept(&mut self, raw: &[f32], denoised: &[f32]) -> anyhow::Result<()> {
        if raw.len() != denoised.len() {
            anyhow::bail!(
                "raw chunk has {} samples but denoised chunk has {}",
                raw.len(),
                denoised.len()
            );
        }
        self.raw.extend_from_slice(raw);
        self.clean.extend_from_slice(denoised);
        Ok(())
    }
}

/// Write a mono WAV file.
pub fn write_wav(
    path: &Path,
    samples: &[f32],
    sample_rate: u32,
    format: ExportFormat,
) -> anyhow::Result<()> {
    let spec = match format {
        ExportFormat::Float32 => WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        },
        ExportFormat::Pcm16 => WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        },
    };

    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create WAV '{}'", path.display()))?;
    match format {
        ExportFormat::Float32 => {
            for &s in samples {
                writer.write_sample(s)?;
            }
        }
        ExportFormat::Pcm16 => {
            for &s in samples {
                writer.write_sample(sample_to_i16(s))?;
            }
        }
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalize WAV '{}'", path.display()))?;
    Ok(())
}

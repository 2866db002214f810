//! Stream and gate configuration.
//!
//! Everything a caller can tune lives here: sample rate, chunk size, warm-up
//! length, lookback size and the four spectral-gate parameters. Configs are
//! plain serde structs so a host can keep them in JSON next to its own settings.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

// -----------------------------------------------------------------------------
// Defaults
// -----------------------------------------------------------------------------

pub const DEFAULT_SAMPLE_RATE: u32 = 16_000;
pub const DEFAULT_CHUNK_SIZE: usize = 1024;
pub const DEFAULT_LOOKBACK_CHUNKS: usize = 45;
pub const DEFAULT_WARMUP_SECONDS: f32 = 3.0;

// Analysis window spans two chunks, hop is a quarter window (75% overlap).
const ANALYSIS_WINDOW_CHUNKS: usize = 2;
const ANALYSIS_HOP_DIV: usize = 4;

// -----------------------------------------------------------------------------
// Spectral gate parameters
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Standard deviations above the per-bin noise mean (dB) that count as signal.
    pub std_thresh: f32,
    /// Bins on each side over which the signal/noise decision is blurred.
    pub freq_smoothing: usize,
    /// Frames on each side over which the decision is blurred; 0 disables it.
    pub time_smoothing: usize,
    /// 1.0 silences noise bins entirely, 0.0 leaves them untouched.
    pub decrease_ratio: f32,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            std_thresh: 1.5,
            freq_smoothing: 2,
            time_smoothing: 0,
            decrease_ratio: 1.0,
        }
    }
}

impl GateConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.std_thresh.is_finite() || self.std_thresh < 0.0 {
            return Err(ConfigError::InvalidStdThresh(self.std_thresh));
        }
        if !self.decrease_ratio.is_finite() || !(0.0..=1.0).contains(&self.decrease_ratio) {
            return Err(ConfigError::DecreaseRatioOutOfRange(self.decrease_ratio));
        }
        Ok(())
    }

    /// Lowest gain the mask can produce.
    #[inline]
    pub fn gain_floor(&self) -> f32 {
        1.0 - self.decrease_ratio
    }
}

// -----------------------------------------------------------------------------
// Stream parameters
// -----------------------------------------------------------------------------

/// How long the processor passes audio through before gating starts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warmup {
    Chunks(usize),
    Seconds(f32),
}

impl Default for Warmup {
    fn default() -> Self {
        Warmup::Seconds(DEFAULT_WARMUP_SECONDS)
    }
}

impl Warmup {
    /// Warm-up length in whole chunks (seconds round up).
    pub fn chunks(&self, sample_rate: u32, chunk_size: usize) -> usize {
        match *self {
            Warmup::Chunks(n) => n,
            Warmup::Seconds(s) => {
                // Whole samples first so f32 error cannot push an exact
                // chunk multiple over the next boundary.
                let samples = (s.max(0.0) as f64 * sample_rate as f64).round() as usize;
                samples.div_ceil(chunk_size.max(1))
            }
        }
    }
}

/// Where the gate takes its noise statistics from once gating has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseReference {
    /// The trailing lookback window is both the noise reference and the signal.
    #[default]
    Lookback,
    /// Profile is estimated once from the history held when warm-up ends and
    /// then frozen. Changes the observed behavior; opt in explicitly.
    WarmUp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    pub sample_rate: u32,
    pub chunk_size: usize,
    pub warmup: Warmup,
    pub lookback_chunks: usize,
    pub noise_reference: NoiseReference,
    pub gate: GateConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            chunk_size: DEFAULT_CHUNK_SIZE,
            warmup: Warmup::default(),
            lookback_chunks: DEFAULT_LOOKBACK_CHUNKS,
            noise_reference: NoiseReference::default(),
            gate: GateConfig::default(),
        }
    }
}

impl StreamConfig {
    #[inline]
    pub fn analysis_window(&self) -> usize {
        self.chunk_size * ANALYSIS_WINDOW_CHUNKS
    }

    #[inline]
    pub fn analysis_hop(&self) -> usize {
        self.analysis_window() / ANALYSIS_HOP_DIV
    }

    #[inline]
    pub fn warmup_chunks(&self) -> usize {
        self.warmup.chunks(self.sample_rate, self.chunk_size)
    }

    #[inline]
    pub fn lookback_samples(&self) -> usize {
        self.lookback_chunks * self.chunk_size
    }

    /// Real-time budget for one chunk, in seconds.
    pub fn chunk_duration_secs(&self) -> f64 {
        self.chunk_size as f64 / self.sample_rate.max(1) as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        if self.chunk_size < 2 {
            return Err(ConfigError::ChunkSizeTooSmall {
                chunk_size: self.chunk_size,
            });
        }
        if self.lookback_chunks == 0 {
            return Err(ConfigError::ZeroLookback);
        }
        if let Warmup::Seconds(s) = self.warmup {
            if !s.is_finite() || s < 0.0 {
                return Err(ConfigError::InvalidWarmupSeconds(s));
            }
        }
        self.gate.validate()?;

        let window = self.analysis_window();
        if self.lookback_samples() < window {
            return Err(ConfigError::LookbackShorterThanWindow {
                lookback_samples: self.lookback_samples(),
                window,
            });
        }
        if self.noise_reference == NoiseReference::WarmUp {
            // The frozen profile comes from history retained at the end of warm-up.
            let warmup_samples =
                self.warmup_chunks().min(self.lookback_chunks) * self.chunk_size;
            if warmup_samples < window {
                return Err(ConfigError::WarmupShorterThanWindow {
                    warmup_samples,
                    window,
                });
            }
        }
        Ok(())
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: StreamConfig =
            serde_json::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

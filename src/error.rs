//! Error types for the streaming denoiser.
//!
//! Configuration problems are caught when a gate or processor is built and are
//! never produced mid-stream. Transform errors belong to a single chunk; the
//! stream processor turns them into pass-through output and keeps going.

use std::fmt;

/// Invalid parameter combinations, raised eagerly at construction.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroSampleRate,
    ChunkSizeTooSmall { chunk_size: usize },
    ZeroLookback,
    /// The lookback window cannot hold a single analysis window.
    LookbackShorterThanWindow { lookback_samples: usize, window: usize },
    /// Warm-up segment too short to estimate a frozen noise profile from.
    WarmupShorterThanWindow { warmup_samples: usize, window: usize },
    InvalidWarmupSeconds(f32),
    InvalidStdThresh(f32),
    DecreaseRatioOutOfRange(f32),
    InvalidStftGeometry { fft_size: usize, hop_size: usize },
    /// A segment handed to the gate yields no full analysis window.
    SegmentTooShort { len: usize, window: usize },
    /// Configuration text could not be parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSampleRate => write!(f, "sample rate must be > 0"),
            ConfigError::ChunkSizeTooSmall { chunk_size } => {
                write!(f, "chunk size {} is too small (minimum 2)", chunk_size)
            }
            ConfigError::ZeroLookback => write!(f, "lookback must span at least one chunk"),
            ConfigError::LookbackShorterThanWindow {
                lookback_samples,
                window,
            } => write!(
                f,
                "lookback of {} samples is shorter than the {}-sample analysis window",
                lookback_samples, window
            ),
            ConfigError::WarmupShorterThanWindow {
                warmup_samples,
                window,
            } => write!(
                f,
                "warm-up of {} samples is shorter than the {}-sample analysis window",
                warmup_samples, window
            ),
            ConfigError::InvalidWarmupSeconds(s) => {
                write!(f, "warm-up duration must be finite and >= 0 (got {})", s)
            }
            ConfigError::InvalidStdThresh(v) => {
                write!(f, "std_thresh must be finite and >= 0 (got {})", v)
            }
            ConfigError::DecreaseRatioOutOfRange(v) => {
                write!(f, "decrease_ratio must lie in [0, 1] (got {})", v)
            }
            ConfigError::InvalidStftGeometry { fft_size, hop_size } => write!(
                f,
                "invalid STFT geometry: fft_size={} hop_size={}",
                fft_size, hop_size
            ),
            ConfigError::SegmentTooShort { len, window } => write!(
                f,
                "segment of {} samples is shorter than one {}-sample analysis window",
                len, window
            ),
            ConfigError::Parse(msg) => write!(f, "failed to parse configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Numeric failure inside the forward or inverse transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    NonFiniteInput { index: usize },
    NonFiniteOutput { index: usize },
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::NonFiniteInput { index } => {
                write!(f, "non-finite input sample at index {}", index)
            }
            TransformError::NonFiniteOutput { index } => {
                write!(f, "transform produced a non-finite sample at index {}", index)
            }
        }
    }
}

impl std::error::Error for TransformError {}

#[derive(Debug, Clone, PartialEq)]
pub enum DenoiseError {
    Config(ConfigError),
    /// Output or chunk length differs from what the operation requires.
    LengthMismatch { expected: usize, actual: usize },
    Transform(TransformError),
}

impl fmt::Display for DenoiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenoiseError::Config(e) => write!(f, "configuration error: {}", e),
            DenoiseError::LengthMismatch { expected, actual } => write!(
                f,
                "length mismatch: expected {} samples, got {}",
                expected, actual
            ),
            DenoiseError::Transform(e) => write!(f, "transform error: {}", e),
        }
    }
}

impl std::error::Error for DenoiseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DenoiseError::Config(e) => Some(e),
            DenoiseError::Transform(e) => Some(e),
            DenoiseError::LengthMismatch { .. } => None,
        }
    }
}

impl From<ConfigError> for DenoiseError {
    fn from(e: ConfigError) -> Self {
        DenoiseError::Config(e)
    }
}

impl From<TransformError> for DenoiseError {
    fn from(e: TransformError) -> Self {
        DenoiseError::Transform(e)
    }
}

/// Index of the first NaN or infinite sample, if any.
pub(crate) fn first_non_finite(samples: &[f32]) -> Option<usize> {
    samples.iter().position(|s| !s.is_finite())
}

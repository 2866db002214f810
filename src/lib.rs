//! Streaming spectral-gating noise reduction for mono audio.
//!
//! Audio arrives in fixed-size chunks. After a short warm-up, every chunk is
//! appended to a rolling history, the trailing lookback window is gated in the
//! STFT domain against its own noise statistics, and the newest chunk of the
//! result is emitted. One chunk in, one chunk out.
//!
//! ```no_run
//! use specgate::{StreamConfig, StreamProcessor};
//!
//! let mut processor = StreamProcessor::new(StreamConfig::default())?;
//! let chunk = vec![0.0f32; processor.chunk_size()];
//! let out = processor.ingest(&chunk)?;
//! assert_eq!(out.denoised.len(), chunk.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod dsp;
pub mod error;
pub mod io;
pub mod presets;
pub mod stream;

pub use config::{GateConfig, NoiseReference, StreamConfig, Warmup};
pub use dsp::{NoiseProfile, SpectralGate};
pub use error::{ConfigError, DenoiseError, TransformError};
pub use presets::GatePreset;
pub use stream::{GateState, Ingested, SampleBuffer, StreamProcessor, StreamStats};

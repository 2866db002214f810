//! Streaming driver around the batch spectral gate.
//!
//! # Lifecycle
//! - **WarmingUp**: chunks are recorded and passed through untouched. The first
//!   seconds of audio are assumed to describe the room; nothing guarantees
//!   they really are noise-only.
//! - **Gating**: every chunk is appended, the trailing lookback window is gated
//!   and only its newest chunk is emitted. There is no way back to WarmingUp
//!   short of [`StreamProcessor::reset`].
//!
//! # Noise reference
//! By default the lookback window is gated against its own statistics
//! ("denoise this window against its recent profile"). With
//! [`NoiseReference::WarmUp`] the profile is taken once from the history held
//! when warm-up ends and reused for the rest of the stream.
//!
//! # Failure handling
//! One chunk in, one chunk out, always `chunk_size` long. A chunk that cannot be
//! gated (non-finite samples, numeric failure) is passed through, counted and
//! reported in [`Ingested::fault`]; the stream carries on with the next chunk.

use crate::config::{NoiseReference, StreamConfig};
use crate::dsp::spectral_gate::{NoiseProfile, SpectralGate};
use crate::error::{first_non_finite, ConfigError, DenoiseError, TransformError};
use crate::stream::sample_buffer::{History, SampleBuffer};
use log::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    WarmingUp,
    Gating,
}

/// Running counters for one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StreamStats {
    pub chunks_ingested: u64,
    pub chunks_gated: u64,
    pub chunks_passed_through: u64,
    pub transform_failures: u64,
    /// Gated windows that held less than the configured lookback.
    pub clamped_windows: u64,
    /// Mean mask gain of the most recent gated window.
    pub last_mean_gain: f32,
}

/// Output of one [`StreamProcessor::ingest`] call.
#[derive(Debug)]
pub struct Ingested<'a> {
    /// Zero-based position of this chunk in the stream.
    pub chunk_index: u64,
    /// State the chunk was processed in.
    pub state: GateState,
    pub denoised: &'a [f32],
    /// Set when the chunk could not be gated and was passed through instead.
    pub fault: Option<TransformError>,
}

impl Ingested<'_> {
    #[inline]
    pub fn is_gated(&self) -> bool {
        self.state == GateState::Gating && self.fault.is_none()
    }
}

pub struct StreamProcessor {
    config: StreamConfig,
    warmup_chunks: usize,
    state: GateState,

    history: SampleBuffer,
    gate: SpectralGate,
    frozen_profile: Option<NoiseProfile>,

    // Scratch
    sanitized: Vec<f32>,
    window: Vec<f32>,
    gated: Vec<f32>,
    output: Vec<f32>,

    stats: StreamStats,
}

impl StreamProcessor {
    pub fn new(config: StreamConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let gate = SpectralGate::new(config.gate, config.analysis_window(), config.analysis_hop())?;
        let warmup_chunks = config.warmup_chunks();
        let lookback = config.lookback_samples();

        info!(
            "StreamProcessor: {} Hz, chunk {} ({:.1} ms), warm-up {} chunks, lookback {} chunks, reference {:?}",
            config.sample_rate,
            config.chunk_size,
            config.chunk_duration_secs() * 1000.0,
            warmup_chunks,
            config.lookback_chunks,
            config.noise_reference
        );

        let mut processor = Self {
            history: SampleBuffer::new(config.chunk_size, config.lookback_chunks),
            gate,
            frozen_profile: None,
            sanitized: vec![0.0; config.chunk_size],
            window: Vec::with_capacity(lookback),
            gated: vec![0.0; lookback],
            output: vec![0.0; config.chunk_size],
            warmup_chunks,
            state: GateState::WarmingUp,
            stats: StreamStats::default(),
            config,
        };
        if warmup_chunks == 0 {
            processor.state = GateState::Gating;
        }
        Ok(processor)
    }

    #[inline]
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    #[inline]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.config.chunk_size
    }

    #[inline]
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    #[inline]
    pub fn warmup_chunks(&self) -> usize {
        self.warmup_chunks
    }

    #[inline]
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Frozen profile in [`NoiseReference::WarmUp`] mode, once warm-up is over.
    pub fn frozen_profile(&self) -> Option<&NoiseProfile> {
        self.frozen_profile.as_ref()
    }

    /// Drop all history and start warming up again.
    pub fn reset(&mut self) {
        self.history.clear();
        self.frozen_profile = None;
        self.stats = StreamStats::default();
        self.state = if self.warmup_chunks == 0 {
            GateState::Gating
        } else {
            GateState::WarmingUp
        };
        info!("StreamProcessor reset");
    }

    /// Process one chunk and return its denoised counterpart.
    ///
    /// Only a chunk of the wrong length is an error; it leaves the processor
    /// untouched.
    pub fn ingest(&mut self, chunk: &[f32]) -> Result<Ingested<'_>, DenoiseError> {
        let chunk_size = self.config.chunk_size;
        if chunk.len() != chunk_size {
            return Err(DenoiseError::LengthMismatch {
                expected: chunk_size,
                actual: chunk.len(),
            });
        }

        let chunk_index = self.stats.chunks_ingested;
        let mut fault = first_non_finite(chunk).map(|index| TransformError::NonFiniteInput { index });

        // History never holds non-finite samples; they would poison every
        // window the chunk stays in.
        self.sanitized.copy_from_slice(chunk);
        if fault.is_some() {
            for s in &mut self.sanitized {
                if !s.is_finite() {
                    *s = 0.0;
                }
            }
        }
        self.history.append(&self.sanitized)?;
        self.stats.chunks_ingested += 1;

        let state = self.state;
        let gated = match state {
            GateState::WarmingUp => {
                if self.stats.chunks_ingested >= self.warmup_chunks as u64 {
                    self.finish_warmup();
                }
                false
            }
            GateState::Gating if fault.is_some() => false,
            GateState::Gating => match self.gate_latest() {
                Ok(gated) => gated,
                Err(e) => {
                    fault = Some(e);
                    false
                }
            },
        };

        if gated {
            self.stats.chunks_gated += 1;
        } else {
            self.output.copy_from_slice(chunk);
            self.stats.chunks_passed_through += 1;
        }

        if let Some(e) = fault {
            self.stats.transform_failures += 1;
            warn!("chunk {}: {}; passed through", chunk_index, e);
        }

        Ok(Ingested {
            chunk_index,
            state,
            denoised: &self.output,
            fault,
        })
    }

    fn finish_warmup(&mut self) {
        self.state = GateState::Gating;

        if self.config.noise_reference == NoiseReference::WarmUp {
            self.history
                .tail_into(self.config.lookback_chunks, &mut self.window);
            match self.gate.estimate_profile(&self.window) {
                Ok(profile) => {
                    debug!(
                        "frozen noise profile from {} samples ({} frames)",
                        self.window.len(),
                        profile.frames()
                    );
                    self.frozen_profile = Some(profile);
                }
                Err(e) => {
                    // Falls back to the lookback window as reference.
                    warn!("could not freeze warm-up noise profile: {}", e);
                }
            }
        }

        info!(
            "warm-up complete after {} chunks; gating enabled",
            self.stats.chunks_ingested
        );
    }

    /// Gate the lookback window and copy its newest chunk into `output`.
    /// `Ok(false)` means the history is still too short to gate.
    fn gate_latest(&mut self) -> Result<bool, TransformError> {
        let history = self
            .history
            .tail_into(self.config.lookback_chunks, &mut self.window);
        if let History::Insufficient {
            available_chunks,
            requested_chunks,
        } = history
        {
            self.stats.clamped_windows += 1;
            debug!(
                "lookback clamped to {} of {} chunks",
                available_chunks, requested_chunks
            );
        }

        if self.window.len() < self.gate.min_segment_len() {
            return Ok(false);
        }

        let len = self.window.len();
        let out = &mut self.gated[..len];
        let result = match &self.frozen_profile {
            Some(profile) => self.gate.apply(profile, &self.window, out),
            None => self.gate.process_into(&self.window, &self.window, out),
        };

        match result {
            Ok(stats) => {
                self.stats.last_mean_gain = stats.mean_gain;
                let chunk_size = self.config.chunk_size;
                self.output
                    .copy_from_slice(&self.gated[len - chunk_size..len]);
                Ok(true)
            }
            Err(DenoiseError::Transform(e)) => Err(e),
            Err(e) => {
                // Lengths and geometry are fixed at construction.
                warn!("spectral gate rejected window: {}", e);
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GateConfig, Warmup};

    fn small_config(warmup: usize) -> StreamConfig {
        StreamConfig {
            sample_rate: 8_000,
            chunk_size: 256,
            warmup: Warmup::Chunks(warmup),
            lookback_chunks: 8,
            noise_reference: NoiseReference::Lookback,
            gate: GateConfig::default(),
        }
    }

    fn noisy_chunk(seed: usize, len: usize) -> Vec<f32> {
        // Cheap deterministic pseudo-noise, enough for state-machine tests.
        (0..len)
            .map(|i| {
                let x = ((seed * len + i) as f32 * 12.9898).sin() * 43_758.547;
                (x - x.floor() - 0.5) * 0.2
            })
            .collect()
    }

    #[test]
    fn test_invalid_config_rejected_eagerly() {
        let mut cfg = small_config(4);
        cfg.gate.decrease_ratio = 3.0;
        assert!(StreamProcessor::new(cfg).is_err());
    }

    #[test]
    fn test_warmup_passes_through_then_gates() {
        let mut p = StreamProcessor::new(small_config(4)).unwrap();
        assert_eq!(p.state(), GateState::WarmingUp);

        for i in 0..4 {
            let chunk = noisy_chunk(i, 256);
            let out = p.ingest(&chunk).unwrap();
            assert_eq!(out.state, GateState::WarmingUp);
            assert_eq!(out.chunk_index, i as u64);
            assert_eq!(out.denoised, &chunk[..]);
        }
        assert_eq!(p.state(), GateState::Gating);

        let chunk = noisy_chunk(4, 256);
        let out = p.ingest(&chunk).unwrap();
        assert_eq!(out.state, GateState::Gating);
        assert!(out.is_gated());
        assert_eq!(out.denoised.len(), 256);
        assert_ne!(out.denoised, &chunk[..]);
        assert_eq!(p.stats().chunks_gated, 1);
        assert_eq!(p.stats().chunks_passed_through, 4);
    }

    #[test]
    fn test_wrong_chunk_length_leaves_state_untouched() {
        let mut p = StreamProcessor::new(small_config(2)).unwrap();
        assert!(matches!(
            p.ingest(&[0.0; 100]),
            Err(DenoiseError::LengthMismatch {
                expected: 256,
                actual: 100
            })
        ));
        assert_eq!(p.stats().chunks_ingested, 0);
    }

    #[test]
    fn test_zero_warmup_clamps_short_history() {
        let mut p = StreamProcessor::new(small_config(0)).unwrap();
        assert_eq!(p.state(), GateState::Gating);

        // One chunk is shorter than the 512-sample analysis window: pass-through.
        let first = noisy_chunk(0, 256);
        let out = p.ingest(&first).unwrap();
        assert_eq!(out.denoised, &first[..]);
        assert!(out.fault.is_none());

        // Two chunks fill one window: gated on clamped history.
        let out = p.ingest(&noisy_chunk(1, 256)).unwrap();
        assert!(out.is_gated());
        assert_eq!(p.stats().clamped_windows, 2);
        assert_eq!(p.stats().transform_failures, 0);
    }

    #[test]
    fn test_non_finite_chunk_passes_through_and_is_counted() {
        let mut p = StreamProcessor::new(small_config(2)).unwrap();
        for i in 0..2 {
            p.ingest(&noisy_chunk(i, 256)).unwrap();
        }

        let mut bad = noisy_chunk(2, 256);
        bad[10] = f32::INFINITY;
        let out = p.ingest(&bad).unwrap();
        assert_eq!(out.fault, Some(TransformError::NonFiniteInput { index: 10 }));
        assert_eq!(out.denoised[10], f32::INFINITY);
        assert_eq!(out.denoised.len(), 256);
        assert_eq!(p.stats().transform_failures, 1);

        // Next chunk gates normally: history holds no non-finite samples.
        let out = p.ingest(&noisy_chunk(3, 256)).unwrap();
        assert!(out.is_gated());
        assert!(out.denoised.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn test_warm_up_reference_freezes_profile() {
        let cfg = StreamConfig {
            noise_reference: NoiseReference::WarmUp,
            ..small_config(4)
        };
        let mut p = StreamProcessor::new(cfg).unwrap();
        for i in 0..3 {
            p.ingest(&noisy_chunk(i, 256)).unwrap();
        }
        assert!(p.frozen_profile().is_none());
        p.ingest(&noisy_chunk(3, 256)).unwrap();

        let frames = p.frozen_profile().map(|prof| prof.frames());
        assert_eq!(frames, Some(4 * 256 / 128 + 1));

        let out = p.ingest(&noisy_chunk(4, 256)).unwrap();
        assert!(out.is_gated());
    }

    #[test]
    fn test_reset_returns_to_warm_up() {
        let mut p = StreamProcessor::new(small_config(2)).unwrap();
        for i in 0..5 {
            p.ingest(&noisy_chunk(i, 256)).unwrap();
        }
        assert_eq!(p.state(), GateState::Gating);

        p.reset();
        assert_eq!(p.state(), GateState::WarmingUp);
        assert_eq!(p.stats(), &StreamStats::default());

        let chunk = noisy_chunk(9, 256);
        let out = p.ingest(&chunk).unwrap();
        assert_eq!(out.chunk_index, 0);
        assert_eq!(out.denoised, &chunk[..]);
    }
}

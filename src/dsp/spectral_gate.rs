//! Spectral Gate (batch)
//!
//! Given a noise reference and a signal segment, produce a denoised signal of
//! identical length.
//!
//! # Model
//! 1. STFT of the noise reference, magnitude in dB per (frame, bin).
//! 2. Per bin: mean and standard deviation over noise frames,
//!    `threshold = mean + std_thresh * std`.
//! 3. STFT of the signal; a cell is "signal" when its dB magnitude reaches the
//!    threshold of its bin, otherwise "noise".
//! 4. The 0/1 decision grid is blurred over `freq_smoothing` bins and
//!    `time_smoothing` frames into a continuous mask in [0, 1].
//! 5. `gain = mask * decrease_ratio + (1 - decrease_ratio)` scales magnitudes;
//!    phase is untouched.
//! 6. Inverse STFT with matching window, trimmed to the signal length.
//!
//! The gate never amplifies: every gain lies in [1 - decrease_ratio, 1].
//!
//! # Allocation
//! Spectrograms, dB grids and masks are owned by the gate and reused between
//! calls; after the first call on a given segment length nothing is allocated.

use crate::config::GateConfig;
use crate::dsp::mask::MaskSmoother;
use crate::dsp::stft::{Spectrogram, StftEngine};
use crate::dsp::utils::amp_to_db;
use crate::error::{first_non_finite, ConfigError, DenoiseError, TransformError};

/// Per-bin noise statistics in dB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoiseProfile {
    mean_db: Vec<f32>,
    std_db: Vec<f32>,
    thresholds_db: Vec<f32>,
    frames: usize,
}

impl NoiseProfile {
    #[inline]
    pub fn num_bins(&self) -> usize {
        self.thresholds_db.len()
    }

    /// Number of STFT frames the statistics were taken over.
    #[inline]
    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn mean_db(&self) -> &[f32] {
        &self.mean_db
    }

    pub fn std_db(&self) -> &[f32] {
        &self.std_db
    }

    pub fn thresholds_db(&self) -> &[f32] {
        &self.thresholds_db
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// Summary of one gate invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GateStats {
    pub frames: usize,
    /// Average gain over every (frame, bin) cell; 1.0 means nothing was gated.
    pub mean_gain: f32,
}

pub struct SpectralGate {
    config: GateConfig,
    stft: StftEngine,
    smoother: MaskSmoother,

    // Scratch
    noise_spec: Spectrogram,
    signal_spec: Spectrogram,
    mask: Vec<f32>,
    profile: NoiseProfile,
}

impl SpectralGate {
    pub fn new(config: GateConfig, fft_size: usize, hop_size: usize) -> Result<Self, ConfigError> {
        config.validate()?;
        let stft = StftEngine::new(fft_size, hop_size)?;

        Ok(Self {
            config,
            stft,
            smoother: MaskSmoother::new(config.freq_smoothing, config.time_smoothing),
            noise_spec: Spectrogram::new(),
            signal_spec: Spectrogram::new(),
            mask: Vec::new(),
            profile: NoiseProfile::default(),
        })
    }

    /// Window of two chunks with 75% overlap.
    pub fn for_chunk_size(config: GateConfig, chunk_size: usize) -> Result<Self, ConfigError> {
        let fft_size = chunk_size * 2;
        Self::new(config, fft_size, fft_size / 4)
    }

    #[inline]
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Shortest segment the gate accepts (one analysis window).
    #[inline]
    pub fn min_segment_len(&self) -> usize {
        self.stft.fft_size()
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.stft.fft_size()
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.stft.hop_size()
    }

    pub fn estimate_profile(&mut self, noise: &[f32]) -> Result<NoiseProfile, DenoiseError> {
        let mut profile = NoiseProfile::default();
        self.estimate_profile_into(noise, &mut profile)?;
        Ok(profile)
    }

    pub fn estimate_profile_into(
        &mut self,
        noise: &[f32],
        profile: &mut NoiseProfile,
    ) -> Result<(), DenoiseError> {
        if let Some(index) = first_non_finite(noise) {
            return Err(TransformError::NonFiniteInput { index }.into());
        }
        self.stft.forward(noise, &mut self.noise_spec)?;

        let frames = self.noise_spec.num_frames();
        let bins = self.noise_spec.num_bins();

        profile.mean_db.clear();
        profile.mean_db.resize(bins, 0.0);
        profile.std_db.clear();
        profile.std_db.resize(bins, 0.0);
        profile.thresholds_db.clear();
        profile.thresholds_db.resize(bins, 0.0);
        profile.frames = frames;

        // Pass 1: mean
        for f in 0..frames {
            for (m, c) in profile.mean_db.iter_mut().zip(self.noise_spec.frame(f)) {
                *m += amp_to_db(c.norm());
            }
        }
        let inv = 1.0 / frames as f32;
        for m in &mut profile.mean_db {
            *m *= inv;
        }

        // Pass 2: population variance around the mean
        for f in 0..frames {
            let row = self.noise_spec.frame(f);
            for b in 0..bins {
                let d = amp_to_db(row[b].norm()) - profile.mean_db[b];
                profile.std_db[b] += d * d;
            }
        }
        for b in 0..bins {
            let sd = (profile.std_db[b] * inv).sqrt();
            profile.std_db[b] = sd;
            profile.thresholds_db[b] = profile.mean_db[b] + self.config.std_thresh * sd;
        }

        Ok(())
    }

    /// Gate `signal` against a previously estimated profile, writing into `out`.
    pub fn apply(
        &mut self,
        profile: &NoiseProfile,
        signal: &[f32],
        out: &mut [f32],
    ) -> Result<GateStats, DenoiseError> {
        if out.len() != signal.len() {
            return Err(DenoiseError::LengthMismatch {
                expected: signal.len(),
                actual: out.len(),
            });
        }
        if let Some(index) = first_non_finite(signal) {
            return Err(TransformError::NonFiniteInput { index }.into());
        }
        if profile.num_bins() != self.stft.num_bins() {
            return Err(DenoiseError::LengthMismatch {
                expected: self.stft.num_bins(),
                actual: profile.num_bins(),
            });
        }

        // 1) Analysis
        self.stft.forward(signal, &mut self.signal_spec)?;
        let frames = self.signal_spec.num_frames();
        let bins = self.signal_spec.num_bins();
        let cells = frames * bins;

        // 2) Decision grid: 1.0 = signal, 0.0 = noise
        self.mask.clear();
        self.mask.resize(cells, 0.0);
        for f in 0..frames {
            let row = self.signal_spec.frame(f);
            for b in 0..bins {
                let idx = f * bins + b;
                let db = amp_to_db(row[b].norm());
                self.mask[idx] = if db >= profile.thresholds_db[b] { 1.0 } else { 0.0 };
            }
        }

        // 3) Smooth decisions into a continuous mask
        self.smoother.smooth(&mut self.mask, frames, bins);

        // 4) Mask -> gain (in place)
        let ratio = self.config.decrease_ratio;
        let floor = self.config.gain_floor();
        let mut gain_sum = 0.0f64;
        for m in &mut self.mask {
            let g = (*m * ratio + floor).clamp(floor, 1.0);
            *m = g;
            gain_sum += g as f64;
        }
        self.signal_spec.apply_gains(&self.mask);

        // 5) Synthesis
        self.stft.inverse(&self.signal_spec, out)?;
        if let Some(index) = first_non_finite(out) {
            return Err(TransformError::NonFiniteOutput { index }.into());
        }

        Ok(GateStats {
            frames,
            mean_gain: if cells > 0 {
                (gain_sum / cells as f64) as f32
            } else {
                1.0
            },
        })
    }

    /// Estimate a profile from `noise` and gate `signal` with it.
    pub fn process_into(
        &mut self,
        noise: &[f32],
        signal: &[f32],
        out: &mut [f32],
    ) -> Result<GateStats, DenoiseError> {
        if out.len() != signal.len() {
            return Err(DenoiseError::LengthMismatch {
                expected: signal.len(),
                actual: out.len(),
            });
        }
        let mut profile = std::mem::take(&mut self.profile);
        let result = self
            .estimate_profile_into(noise, &mut profile)
            .and_then(|_| self.apply(&profile, signal, out));
        self.profile = profile;
        result
    }

    pub fn process(&mut self, noise: &[f32], signal: &[f32]) -> Result<Vec<f32>, DenoiseError> {
        let mut out = vec![0.0; signal.len()];
        self.process_into(noise, signal, &mut out)?;
        Ok(out)
    }

    /// Profile used by the most recent [`process_into`](Self::process_into).
    pub fn last_profile(&self) -> &NoiseProfile {
        &self.profile
    }
}

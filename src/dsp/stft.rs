//! Centered short-time Fourier transform with weighted overlap-add inverse.
//!
//! Frames are centered on multiples of the hop: the segment is reflect-padded
//! by `fft_size / 2` on the left and `fft_size - fft_size / 2` on the right
//! (one window in total, so the last frame fits for odd sizes too), and the
//! padding is trimmed again after synthesis so the inverse returns exactly
//! `len` samples.
//!
//! Analysis and synthesis both use the same periodic Hann window and the
//! overlap-add is normalized per sample by the summed squared window, so a
//! spectrogram that is not modified reconstructs its input exactly.
//!
//! All FFT buffers live in the engine and are reused across calls.

use crate::dsp::utils::{make_hann_window, OLA_NORM_EPS};
use crate::error::ConfigError;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Complex bins `0..=fft_size/2` for every frame, frame-major.
#[derive(Debug, Clone, Default)]
pub struct Spectrogram {
    num_frames: usize,
    num_bins: usize,
    data: Vec<Complex<f32>>,
}

impl Spectrogram {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resize for a new segment; only reallocates when the grid grows.
    pub fn reshape(&mut self, num_frames: usize, num_bins: usize) {
        self.num_frames = num_frames;
        self.num_bins = num_bins;
        self.data
            .resize(num_frames * num_bins, Complex::new(0.0, 0.0));
    }

    #[inline]
    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    #[inline]
    pub fn frame(&self, frame: usize) -> &[Complex<f32>] {
        let start = frame * self.num_bins;
        &self.data[start..start + self.num_bins]
    }

    #[inline]
    pub fn frame_mut(&mut self, frame: usize) -> &mut [Complex<f32>] {
        let start = frame * self.num_bins;
        &mut self.data[start..start + self.num_bins]
    }

    /// Scale every cell by a real gain laid out like the spectrogram.
    /// Phase is left untouched.
    pub fn apply_gains(&mut self, gains: &[f32]) {
        debug_assert_eq!(gains.len(), self.data.len());
        for (c, &g) in self.data.iter_mut().zip(gains) {
            *c *= g;
        }
    }
}

pub struct StftEngine {
    fft: Arc<dyn Fft<f32>>,
    ifft: Arc<dyn Fft<f32>>,

    // Scratch
    scratch: Vec<Complex<f32>>,
    fft_scratch: Vec<Complex<f32>>,
    ifft_scratch: Vec<Complex<f32>>,
    window: Vec<f32>,
    padded: Vec<f32>,
    overlap: Vec<f32>,
    norm: Vec<f32>,

    fft_size: usize,
    hop_size: usize,
}

impl StftEngine {
    pub fn new(fft_size: usize, hop_size: usize) -> Result<Self, ConfigError> {
        if fft_size < 2 || hop_size == 0 || hop_size > fft_size {
            return Err(ConfigError::InvalidStftGeometry { fft_size, hop_size });
        }

        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(fft_size);
        let ifft = planner.plan_fft_inverse(fft_size);

        let fft_scratch_len = fft.get_inplace_scratch_len();
        let ifft_scratch_len = ifft.get_inplace_scratch_len();

        Ok(Self {
            fft,
            ifft,
            scratch: vec![Complex::default(); fft_size],
            fft_scratch: vec![Complex::default(); fft_scratch_len],
            ifft_scratch: vec![Complex::default(); ifft_scratch_len],
            window: make_hann_window(fft_size),
            padded: Vec::new(),
            overlap: Vec::new(),
            norm: Vec::new(),
            fft_size,
            hop_size,
        })
    }

    #[inline]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    #[inline]
    pub fn hop_size(&self) -> usize {
        self.hop_size
    }

    #[inline]
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Number of centered frames covering a segment of `len` samples.
    #[inline]
    pub fn num_frames(&self, len: usize) -> usize {
        len / self.hop_size + 1
    }

    /// Reflect padding on each side; sums to one window.
    #[inline]
    fn pad_sizes(&self) -> (usize, usize) {
        let left = self.fft_size / 2;
        (left, self.fft_size - left)
    }

    fn check_len(&self, len: usize) -> Result<(), ConfigError> {
        if len < self.fft_size {
            return Err(ConfigError::SegmentTooShort {
                len,
                window: self.fft_size,
            });
        }
        Ok(())
    }

    pub fn forward(&mut self, signal: &[f32], spec: &mut Spectrogram) -> Result<(), ConfigError> {
        self.check_len(signal.len())?;

        let (left, right) = self.pad_sizes();
        reflect_pad_into(signal, left, right, &mut self.padded);

        let num_frames = self.num_frames(signal.len());
        let num_bins = self.num_bins();
        spec.reshape(num_frames, num_bins);

        for frame in 0..num_frames {
            let start = frame * self.hop_size;

            // 1) Window
            let seg = &self.padded[start..start + self.fft_size];
            for (i, (&s, &w)) in seg.iter().zip(&self.window).enumerate() {
                self.scratch[i] = Complex::new(s * w, 0.0);
            }

            // 2) FFT
            self.fft
                .process_with_scratch(&mut self.scratch, &mut self.fft_scratch);

            // 3) Keep non-negative frequencies
            spec.frame_mut(frame)
                .copy_from_slice(&self.scratch[..num_bins]);
        }

        Ok(())
    }

    /// Inverse of [`forward`](Self::forward); `out.len()` is the length of the
    /// segment the spectrogram was computed from.
    pub fn inverse(&mut self, spec: &Spectrogram, out: &mut [f32]) -> Result<(), ConfigError> {
        self.check_len(out.len())?;
        let num_bins = self.num_bins();
        if spec.num_bins() != num_bins || spec.num_frames() != self.num_frames(out.len()) {
            return Err(ConfigError::InvalidStftGeometry {
                fft_size: self.fft_size,
                hop_size: self.hop_size,
            });
        }

        let (pad, _) = self.pad_sizes();
        let padded_len = out.len() + self.fft_size;
        self.overlap.clear();
        self.overlap.resize(padded_len, 0.0);
        self.norm.clear();
        self.norm.resize(padded_len, 0.0);

        let nyq = self.fft_size / 2;
        let scale = 1.0 / self.fft_size as f32;

        for frame in 0..spec.num_frames() {
            // 1) Rebuild full spectrum with conjugate symmetry
            self.scratch[..num_bins].copy_from_slice(spec.frame(frame));
            for i in 1..(self.fft_size - nyq) {
                self.scratch[self.fft_size - i] = self.scratch[i].conj();
            }

            // 2) iFFT
            self.ifft
                .process_with_scratch(&mut self.scratch, &mut self.ifft_scratch);

            // 3) Weighted overlap-add
            let pos = frame * self.hop_size;
            for i in 0..self.fft_size {
                let w = self.window[i];
                self.overlap[pos + i] += self.scratch[i].re * scale * w;
                self.norm[pos + i] += w * w;
            }
        }

        // 4) Normalize and trim padding
        for (j, o) in out.iter_mut().enumerate() {
            let n = self.norm[pad + j];
            *o = if n > OLA_NORM_EPS {
                self.overlap[pad + j] / n
            } else {
                0.0
            };
        }

        Ok(())
    }
}

/// Mirror samples around each edge, excluding the edge sample itself.
/// Caller guarantees `signal.len() > left.max(right)`.
fn reflect_pad_into(signal: &[f32], left: usize, right: usize, padded: &mut Vec<f32>) {
    let n = signal.len();
    padded.clear();
    padded.reserve(n + left + right);
    padded.extend((0..left).map(|i| signal[left - i]));
    padded.extend_from_slice(signal);
    padded.extend((0..right).map(|i| signal[n - 2 - i]));
}

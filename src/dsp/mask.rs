//! Decision-grid smoothing.
//!
//! The gate first marks every (frame, bin) cell as signal (1.0) or noise (0.0).
//! A hard grid flickers from frame to frame and produces musical noise, so it is
//! blurred with a separable triangular kernel before becoming a gain.
//!
//! Kernel weights for a half-width `n` are `(n + 1 - |k|) / (n + 1)` for
//! `k in -n..=n`. Near the grid edges only the taps that land inside the grid
//! are used and the result is divided by their summed weight, so a cell at the
//! newest frame is judged on the same scale as one in the middle of the window.

/// One axis of the separable smoothing kernel.
#[derive(Debug, Clone)]
pub struct TriangularKernel {
    taps: Vec<f32>,
    half_width: usize,
}

impl TriangularKernel {
    pub fn new(half_width: usize) -> Self {
        let denom = (half_width + 1) as f32;
        let taps = (0..=2 * half_width)
            .map(|i| {
                let k = i.abs_diff(half_width);
                (half_width + 1 - k) as f32 / denom
            })
            .collect();
        Self { taps, half_width }
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.half_width == 0
    }

    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Smooth `len` values read through `get` and written through `set`.
    #[inline]
    fn smooth_line(&self, len: usize, get: impl Fn(usize) -> f32, mut set: impl FnMut(usize, f32)) {
        let n = self.half_width;
        for i in 0..len {
            let lo = i.saturating_sub(n);
            let hi = (i + n).min(len - 1);
            let mut acc = 0.0f32;
            let mut wsum = 0.0f32;
            for j in lo..=hi {
                let w = self.taps[j + n - i];
                acc += w * get(j);
                wsum += w;
            }
            set(i, acc / wsum);
        }
    }
}

/// Separable smoother for a frame-major `num_frames × num_bins` grid.
#[derive(Debug, Clone)]
pub struct MaskSmoother {
    freq: TriangularKernel,
    time: TriangularKernel,
    tmp: Vec<f32>,
}

impl MaskSmoother {
    pub fn new(freq_smoothing: usize, time_smoothing: usize) -> Self {
        Self {
            freq: TriangularKernel::new(freq_smoothing),
            time: TriangularKernel::new(time_smoothing),
            tmp: Vec::new(),
        }
    }

    /// Blur `grid` in place along frequency, then along time.
    pub fn smooth(&mut self, grid: &mut [f32], num_frames: usize, num_bins: usize) {
        debug_assert_eq!(grid.len(), num_frames * num_bins);
        if num_frames == 0 || num_bins == 0 {
            return;
        }

        self.tmp.clear();
        self.tmp.resize(grid.len(), 0.0);

        // Frequency axis: grid -> tmp
        if self.freq.is_identity() {
            self.tmp.copy_from_slice(grid);
        } else {
            for f in 0..num_frames {
                let row = &grid[f * num_bins..(f + 1) * num_bins];
                let out = &mut self.tmp[f * num_bins..(f + 1) * num_bins];
                self.freq
                    .smooth_line(num_bins, |b| row[b], |b, v| out[b] = v);
            }
        }

        // Time axis: tmp -> grid
        if self.time.is_identity() {
            grid.copy_from_slice(&self.tmp);
        } else {
            let tmp = &self.tmp;
            for b in 0..num_bins {
                self.time.smooth_line(
                    num_frames,
                    |f| tmp[f * num_bins + b],
                    |f, v| grid[f * num_bins + b] = v,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_shape() {
        let k = TriangularKernel::new(2);
        let expected = [1.0 / 3.0, 2.0 / 3.0, 1.0, 2.0 / 3.0, 1.0 / 3.0];
        for (a, b) in k.taps().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
        assert_eq!(TriangularKernel::new(0).taps(), &[1.0]);
    }

    #[test]
    fn test_identity_leaves_grid_alone() {
        let mut smoother = MaskSmoother::new(0, 0);
        let mut grid = vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0];
        let before = grid.clone();
        smoother.smooth(&mut grid, 2, 3);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_single_signal_cell_spreads_in_frequency() {
        let mut smoother = MaskSmoother::new(2, 0);
        let mut grid = vec![0.0; 9];
        grid[4] = 1.0;
        smoother.smooth(&mut grid, 1, 9);

        // Interior cells: weight / 3 (kernel sum)
        assert!((grid[4] - 1.0 / 3.0).abs() < 1e-6);
        assert!((grid[3] - 2.0 / 9.0).abs() < 1e-6);
        assert!((grid[2] - 1.0 / 9.0).abs() < 1e-6);
        assert_eq!(grid[1], 0.0);
        assert_eq!(grid[7], 0.0);
    }

    #[test]
    fn test_edges_are_renormalized() {
        let mut smoother = MaskSmoother::new(2, 2);
        let mut grid = vec![1.0; 4 * 6];
        smoother.smooth(&mut grid, 4, 6);
        for v in grid {
            assert!((v - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_time_smoothing_spreads_across_frames() {
        let mut smoother = MaskSmoother::new(0, 1);
        // 3 frames x 2 bins, signal only in the middle frame of bin 0
        let mut grid = vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0];
        smoother.smooth(&mut grid, 3, 2);
        assert!((grid[0] - 1.0 / 3.0).abs() < 1e-6); // edge: taps 1.0 + 0.5
        assert!((grid[2] - 0.5).abs() < 1e-6);
        assert!((grid[4] - 1.0 / 3.0).abs() < 1e-6);
        assert_eq!(grid[1], 0.0);
    }

    #[test]
    fn test_mask_stays_in_unit_range() {
        let mut smoother = MaskSmoother::new(3, 2);
        let mut grid: Vec<f32> = (0..50).map(|i| if i % 3 == 0 { 1.0 } else { 0.0 }).collect();
        smoother.smooth(&mut grid, 5, 10);
        assert!(grid.iter().all(|&v| (0.0..=1.0 + 1e-6).contains(&v)));
    }
}

use std::f32::consts::PI;

/// Magnitude floor applied before taking logs (-200 dB).
pub const MAG_FLOOR: f32 = 1e-10;

// Window-energy floor below which overlap-add normalization is skipped.
pub const OLA_NORM_EPS: f32 = 1e-8;

/// Periodic Hann window (the DFT-even form used for STFT analysis).
pub fn make_hann_window(len: usize) -> Vec<f32> {
    let n = len.max(1) as f32;
    (0..len)
        .map(|i| {
            let s = (PI * i as f32 / n).sin();
            s * s
        })
        .collect()
}

#[inline]
pub fn amp_to_db(mag: f32) -> f32 {
    20.0 * mag.max(MAG_FLOOR).log10()
}

pub fn energy(x: &[f32]) -> f32 {
    let mut s = 0.0f32;
    for &v in x {
        s += v * v;
    }
    s
}

/// Root-mean-square level of a block.
pub fn frame_rms(x: &[f32]) -> f32 {
    (energy(x) / (x.len().max(1) as f32)).sqrt()
}

//! Conversions between integer PCM and normalized samples.
//!
//! Integer samples are divided by their magnitude ceiling `2^(bits - 1)`, so
//! 16-bit audio maps -32768..=32767 onto -1.0..1.0.

/// Normalize a signed integer sample of the given bit depth.
#[inline]
pub fn int_to_sample(value: i32, bits: u16) -> f32 {
    let bits = bits.clamp(1, 32) as i32;
    let ceiling = (1u64 << (bits - 1)) as f32;
    value as f32 / ceiling
}

#[inline]
pub fn i16_to_sample(value: i16) -> f32 {
    value as f32 / 32768.0
}

/// Quantize back to 16-bit, clipping out-of-range samples.
#[inline]
pub fn sample_to_i16(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

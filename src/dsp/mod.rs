pub mod mask;
pub mod spectral_gate;
pub mod stft;
pub mod utils;

pub use mask::{MaskSmoother, TriangularKernel};
pub use spectral_gate::{GateStats, NoiseProfile, SpectralGate};
pub use stft::{Spectrogram, StftEngine};

pub mod processor;
pub mod sample_buffer;

pub use processor::{GateState, Ingested, StreamProcessor, StreamStats};
pub use sample_buffer::{History, SampleBuffer};

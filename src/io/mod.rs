//! Boundary adapters: where chunks come from and where they go.

pub mod pcm;
pub mod pipeline;
pub mod sink;
pub mod source;

pub use pipeline::run_stream;
pub use sink::{write_wav, ChunkSink, ExportFormat, SessionRecorder};
pub use source::{ChunkSource, MemorySource, WavSource};

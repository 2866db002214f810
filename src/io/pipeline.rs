//! Blocking driver loop: source -> processor -> sink.

use crate::io::sink::ChunkSink;
use crate::io::source::ChunkSource;
use crate::stream::{StreamProcessor, StreamStats};
use anyhow::{bail, Context};

/// Pump every chunk from `source` through `processor` into `sink` until the
/// source runs dry. Chunks are handled strictly one at a time and in order.
pub fn run_stream<S, K>(
    source: &mut S,
    processor: &mut StreamProcessor,
    sink: &mut K,
) -> anyhow::Result<StreamStats>
where
    S: ChunkSource + ?Sized,
    K: ChunkSink + ?Sized,
{
    if source.chunk_size() != processor.chunk_size() {
        bail!(
            "source chunk size {} does not match processor chunk size {}",
            source.chunk_size(),
            processor.chunk_size()
        );
    }
    if source.sample_rate() != processor.sample_rate() {
        bail!(
            "source rate {} Hz does not match processor rate {} Hz",
            source.sample_rate(),
            processor.sample_rate()
        );
    }

    let mut raw = vec![0.0f32; processor.chunk_size()];
    while source.read_chunk(&mut raw)? {
        let out = processor.ingest(&raw)?;
        let index = out.chunk_index;
        sink.accept(&raw, out.denoised)
            .with_context(|| format!("sink rejected chunk {}", index))?;
    }

    let stats = *processor.stats();
    log::info!(
        "stream finished: {} chunks ({} gated, {} passed through, {} failures)",
        stats.chunks_ingested,
        stats.chunks_gated,
        stats.chunks_passed_through,
        stats.transform_failures
    );
    Ok(stats)
}

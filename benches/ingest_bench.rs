//! Per-chunk cost of a gated ingest at the default stream geometry.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use specgate::{GatePreset, StreamConfig, StreamProcessor};

fn noise_chunk(seed: usize, len: usize) -> Vec<f32> {
    (0..len)
        .map(|i| {
            let x = ((seed * len + i) as f32 * 12.9898).sin() * 43_758.547;
            (x - x.floor() - 0.5) * 0.1
        })
        .collect()
}

fn warmed_up(config: StreamConfig) -> StreamProcessor {
    let mut processor = StreamProcessor::new(config).unwrap();
    for i in 0..processor.warmup_chunks() + 1 {
        let chunk = noise_chunk(i, processor.chunk_size());
        processor.ingest(&chunk).unwrap();
    }
    processor
}

fn bench_ingest(c: &mut Criterion) {
    let chunk = noise_chunk(1000, 1024);

    let mut processor = warmed_up(StreamConfig::default());
    c.bench_function("ingest_gated_16k_1024_lookback45", |b| {
        b.iter(|| {
            let out = processor.ingest(black_box(&chunk)).unwrap();
            black_box(out.denoised[0]);
        });
    });

    let mut processor = warmed_up(StreamConfig {
        gate: GatePreset::Aggressive.config(),
        ..StreamConfig::default()
    });
    c.bench_function("ingest_gated_aggressive_smoothing", |b| {
        b.iter(|| {
            let out = processor.ingest(black_box(&chunk)).unwrap();
            black_box(out.denoised[0]);
        });
    });
}

criterion_group!(benches, bench_ingest);
criterion_main!(benches);

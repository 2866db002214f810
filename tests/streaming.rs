//! End-to-end scenarios for the streaming processor.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use specgate::dsp::utils::{energy, make_hann_window};
use specgate::io::{run_stream, MemorySource, SessionRecorder};
use specgate::{GateConfig, GateState, StreamConfig, StreamProcessor};
use std::f32::consts::PI;

const SR: u32 = 16_000;
const CHUNK: usize = 1024;

fn white_noise(len: usize, amp: f32, seed: u64) -> Vec<f32> {
    let mut rng = SmallRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen_range(-amp..amp)).collect()
}

fn add_tone(x: &mut [f32], start: usize, freq: f32, amp: f32) {
    for (i, v) in x.iter_mut().enumerate().skip(start) {
        *v += amp * (2.0 * PI * freq * i as f32 / SR as f32).sin();
    }
}

/// Hann-windowed Goertzel power at each of `freqs`, summed.
fn band_power(chunk: &[f32], freqs: &[f32]) -> f32 {
    let window = make_hann_window(chunk.len());
    freqs
        .iter()
        .map(|&freq| {
            let w = 2.0 * PI * freq / SR as f32;
            let coeff = 2.0 * w.cos();
            let (mut s1, mut s2) = (0.0f32, 0.0f32);
            for (&v, &win) in chunk.iter().zip(&window) {
                let s = v * win + coeff * s1 - s2;
                s2 = s1;
                s1 = s;
            }
            s1 * s1 + s2 * s2 - coeff * s1 * s2
        })
        .sum()
}

fn gate_all(processor: &mut StreamProcessor, input: &[f32]) -> Vec<Vec<f32>> {
    input
        .chunks(processor.chunk_size())
        .map(|chunk| processor.ingest(chunk).unwrap().denoised.to_vec())
        .collect()
}

#[test]
fn test_silence_stays_silent_and_gating_starts_at_chunk_47() {
    let mut processor = StreamProcessor::new(StreamConfig::default()).unwrap();
    assert_eq!(processor.warmup_chunks(), 47);

    let silence = vec![0.0f32; CHUNK];
    for i in 0..47u64 {
        let out = processor.ingest(&silence).unwrap();
        assert_eq!(out.chunk_index, i);
        assert_eq!(out.state, GateState::WarmingUp);
        assert!(out.denoised.iter().all(|&s| s == 0.0));
    }
    assert_eq!(processor.state(), GateState::Gating);

    for _ in 0..5 {
        let out = processor.ingest(&silence).unwrap();
        assert_eq!(out.state, GateState::Gating);
        assert!(out.fault.is_none());
        assert!(out.denoised.iter().all(|&s| s.abs() < 1e-6));
    }
    assert_eq!(processor.stats().chunks_gated, 5);
}

#[test]
fn test_warm_up_output_is_bit_exact() {
    let mut processor = StreamProcessor::new(StreamConfig::default()).unwrap();
    let input = white_noise(47 * CHUNK, 0.3, 11);
    for (chunk, out) in input.chunks(CHUNK).zip(gate_all(&mut processor, &input)) {
        assert_eq!(out, chunk);
    }
}

#[test]
fn test_tone_burst_survives_while_noise_is_suppressed() {
    // 5 s of noise; a 440 Hz tone enters at chunk 70, late enough that it only
    // occupies a small part of the lookback window when measured.
    let config = StreamConfig {
        gate: GateConfig {
            std_thresh: 1.5,
            freq_smoothing: 0,
            time_smoothing: 0,
            decrease_ratio: 1.0,
        },
        ..StreamConfig::default()
    };
    let mut processor = StreamProcessor::new(config).unwrap();

    let n_chunks = 78;
    let mut input = white_noise(n_chunks * CHUNK, 0.05, 42);
    add_tone(&mut input, 70 * CHUNK, 440.0, 0.5);
    let output = gate_all(&mut processor, &input);
    let raw: Vec<&[f32]> = input.chunks(CHUNK).collect();

    // Noise-only chunks after gating starts.
    let raw_noise: f32 = (50..70).map(|i| energy(raw[i])).sum();
    let out_noise: f32 = (50..70).map(|i| energy(&output[i])).sum();
    assert!(
        out_noise < 0.5 * raw_noise,
        "noise floor not reduced: {} vs {}",
        out_noise,
        raw_noise
    );

    let raw_tone: f32 = (72..78).map(|i| band_power(raw[i], &[440.0])).sum();
    let out_tone: f32 = (72..78).map(|i| band_power(&output[i], &[440.0])).sum();
    assert!(
        out_tone > 0.6 * raw_tone,
        "tone lost: {} vs {}",
        out_tone,
        raw_tone
    );
}

#[test]
fn test_stationary_tone_is_gated_with_the_noise_floor() {
    let config = StreamConfig {
        gate: GateConfig {
            std_thresh: 1.5,
            time_smoothing: 0,
            decrease_ratio: 1.0,
            ..GateConfig::default()
        },
        ..StreamConfig::default()
    };
    let mut processor = StreamProcessor::new(config).unwrap();

    let mut input = white_noise(78 * CHUNK, 0.05, 7);
    add_tone(&mut input, 0, 440.0, 0.5);
    let output = gate_all(&mut processor, &input);
    let raw: Vec<&[f32]> = input.chunks(CHUNK).collect();

    let off_tone = [1_000.0, 1_750.0, 2_500.0, 3_300.0, 4_700.0, 6_100.0];
    let raw_floor: f32 = (47..78).map(|i| band_power(raw[i], &off_tone)).sum();
    let out_floor: f32 = (47..78).map(|i| band_power(&output[i], &off_tone)).sum();
    assert!(
        out_floor < 0.5 * raw_floor,
        "noise floor not reduced: {} vs {}",
        out_floor,
        raw_floor
    );
    // A tone present in every frame of the lookback window sets its own bin
    // statistics, so the self-referenced gate treats it as noise. Pinned so a
    // change of the default noise reference shows up here.
    let raw_tone: f32 = (47..78).map(|i| band_power(raw[i], &[440.0])).sum();
    let out_tone: f32 = (47..78).map(|i| band_power(&output[i], &[440.0])).sum();
    assert!(
        out_tone < 0.5 * raw_tone,
        "stationary tone unexpectedly kept: {} vs {}",
        out_tone,
        raw_tone
    );
}

#[test]
fn test_streams_are_deterministic() {
    let mut input = white_noise(60 * CHUNK, 0.1, 3);
    add_tone(&mut input, 55 * CHUNK, 1_000.0, 0.3);

    let mut a = StreamProcessor::new(StreamConfig::default()).unwrap();
    let mut b = StreamProcessor::new(StreamConfig::default()).unwrap();
    assert_eq!(gate_all(&mut a, &input), gate_all(&mut b, &input));
}

#[test]
fn test_every_output_chunk_has_chunk_length() {
    let config = StreamConfig {
        chunk_size: 300,
        ..StreamConfig::default()
    };
    let mut processor = StreamProcessor::new(config).unwrap();
    let input = white_noise(200 * 300, 0.2, 5);
    for out in gate_all(&mut processor, &input) {
        assert_eq!(out.len(), 300);
        assert!(out.iter().all(|s| s.is_finite()));
    }
    assert_eq!(processor.stats().transform_failures, 0);
}

#[test]
fn test_pipeline_records_whole_stream() {
    let input = white_noise(50 * CHUNK + 100, 0.1, 9);
    let mut source = MemorySource::new(input.clone(), SR, CHUNK);
    let mut processor = StreamProcessor::new(StreamConfig::default()).unwrap();
    let mut recorder = SessionRecorder::new(SR);

    let stats = run_stream(&mut source, &mut processor, &mut recorder).unwrap();
    assert_eq!(stats.chunks_ingested, 51);
    assert_eq!(stats.chunks_gated, 4);
    assert_eq!(recorder.clean().len(), 51 * CHUNK);
    assert_eq!(&recorder.raw()[..input.len()], &input[..]);
    assert_eq!(&recorder.clean()[..47 * CHUNK], &input[..47 * CHUNK]);
}

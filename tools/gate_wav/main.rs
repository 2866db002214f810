use anyhow::{bail, Context, Result};
use specgate::io::{run_stream, ChunkSource, ExportFormat, SessionRecorder, WavSource};
use specgate::dsp::utils::frame_rms;
use specgate::{GatePreset, StreamConfig, StreamProcessor};
use std::path::{Path, PathBuf};

const USAGE: &str =
    "usage: gate_wav <input.wav> [--config file.json] [--preset name] [--out-dir dir] [--pcm16]";

struct Args {
    input: PathBuf,
    config: Option<PathBuf>,
    preset: Option<GatePreset>,
    out_dir: Option<PathBuf>,
    format: ExportFormat,
}

fn parse_args() -> Result<Args> {
    let mut input = None;
    let mut config = None;
    let mut preset = None;
    let mut out_dir = None;
    let mut format = ExportFormat::Float32;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                config = Some(PathBuf::from(args.next().context("--config needs a path")?));
            }
            "--preset" => {
                let name = args.next().context("--preset needs a name")?;
                let found = GatePreset::from_name(&name).with_context(|| {
                    let known: Vec<_> = GatePreset::ALL.iter().map(|p| p.name()).collect();
                    format!("unknown preset '{}' (known: {})", name, known.join(", "))
                })?;
                preset = Some(found);
            }
            "--out-dir" => {
                out_dir = Some(PathBuf::from(args.next().context("--out-dir needs a path")?));
            }
            "--pcm16" => format = ExportFormat::Pcm16,
            "-h" | "--help" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown option '{}'\n{}", other, USAGE),
            other => {
                if input.is_some() {
                    bail!("more than one input given\n{}", USAGE);
                }
                input = Some(PathBuf::from(other));
            }
        }
    }

    Ok(Args {
        input: input.context(USAGE)?,
        config,
        preset,
        out_dir,
        format,
    })
}

fn load_config(path: Option<&Path>) -> Result<StreamConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            StreamConfig::from_json_str(&text)
                .with_context(|| format!("invalid config '{}'", path.display()))
        }
        None => Ok(StreamConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = parse_args()?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(preset) = args.preset {
        log::info!("using preset '{}': {}", preset, preset.description());
        config.gate = preset.config();
    }

    let mut source = WavSource::open(&args.input, config.chunk_size)?;
    config.sample_rate = source.sample_rate();
    let mut processor = StreamProcessor::new(config)?;
    let mut recorder = SessionRecorder::new(processor.sample_rate());

    let stats = run_stream(&mut source, &mut processor, &mut recorder)?;

    let stem = args
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let out_dir = match args.out_dir {
        Some(dir) => dir,
        None => args
            .input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("failed to create '{}'", out_dir.display()))?;
    let raw_path = out_dir.join(format!("{}_raw.wav", stem));
    let clean_path = out_dir.join(format!("{}_clean.wav", stem));
    recorder.export(&raw_path, &clean_path, args.format)?;

    println!("Gate summary for '{}':", args.input.display());
    println!("  chunks processed : {}", stats.chunks_ingested);
    println!("  chunks gated     : {}", stats.chunks_gated);
    println!("  passed through   : {}", stats.chunks_passed_through);
    println!("  transform faults : {}", stats.transform_failures);
    println!("  padded samples   : {}", source.padded_samples());
    println!(
        "  rms raw / clean  : {:.5} / {:.5}",
        frame_rms(recorder.raw()),
        frame_rms(recorder.clean())
    );
    Ok(())
}

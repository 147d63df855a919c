//! `sonido convert` - push a WAV file through the audio stream engine,
//! changing its sample format, channel count, and/or sample rate.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sonido_core::{AudioFormatTag, AudioSpec};
use sonido_stream::AudioStream;

use crate::wav;

#[derive(Args)]
pub struct ConvertArgs {
    /// Input WAV file
    pub input: PathBuf,

    /// Output WAV file
    pub output: PathBuf,

    /// Target sample format: s16, s32, or f32 (default: keep input format)
    #[arg(long)]
    pub format: Option<String>,

    /// Target channel count (default: keep input channel count)
    #[arg(long)]
    pub channels: Option<u8>,

    /// Target sample rate in Hz (default: keep input sample rate)
    #[arg(long)]
    pub rate: Option<i32>,

    /// Bytes fed to the stream per `Put` call
    #[arg(long, default_value_t = sonido_stream::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

fn parse_format(name: &str) -> anyhow::Result<AudioFormatTag> {
    match name.to_ascii_lowercase().as_str() {
        "s16" | "s16le" => Ok(AudioFormatTag::S16LE),
        "s32" | "s32le" => Ok(AudioFormatTag::S32LE),
        "f32" | "f32le" => Ok(AudioFormatTag::F32LE),
        "u8" => Ok(AudioFormatTag::U8),
        other => bail!("unknown format '{other}' (expected s16, s32, f32, or u8)"),
    }
}

fn peak_and_rms(format: AudioFormatTag, bytes: &[u8]) -> (f32, f32) {
    let samples: Vec<f32> = match format {
        AudioFormatTag::F32LE => bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes(c.try_into().unwrap()))
            .collect(),
        AudioFormatTag::S16LE => bytes
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes(c.try_into().unwrap()) as f32 / i16::MAX as f32)
            .collect(),
        AudioFormatTag::S32LE => bytes
            .chunks_exact(4)
            .map(|c| i32::from_le_bytes(c.try_into().unwrap()) as f32 / i32::MAX as f32)
            .collect(),
        _ => return (0.0, 0.0),
    };
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let peak = samples.iter().fold(0.0f32, |m, &s| m.max(s.abs()));
    let mean_sq = samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32;
    (peak, mean_sq.sqrt())
}

fn linear_to_db(x: f32) -> f32 {
    20.0 * x.max(1e-12).log10()
}

pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let (src_spec, data) = wav::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;

    let dst_format = match &args.format {
        Some(name) => parse_format(name)?,
        None => src_spec.format,
    };
    let dst_channels = args.channels.unwrap_or(src_spec.channels);
    let dst_rate = args.rate.unwrap_or(src_spec.freq);
    let dst_spec = AudioSpec::new(dst_format, dst_channels, dst_rate)?;

    tracing::info!(?src_spec, ?dst_spec, "converting");

    let stream = AudioStream::with_chunk_size(args.chunk_size);
    stream.set_format(Some(src_spec), Some(dst_spec))?;

    let bar = ProgressBar::new(data.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {bytes}/{total_bytes} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for block in data.chunks(args.chunk_size.max(1)) {
        stream.put(block)?;
        bar.inc(block.len() as u64);
    }
    stream.flush();
    bar.finish_and_clear();

    let mut out = Vec::new();
    let mut scratch = vec![0u8; args.chunk_size.max(1)];
    loop {
        let n = stream.get(&mut scratch)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&scratch[..n]);
    }

    wav::write(&args.output, dst_spec, &out)
        .with_context(|| format!("writing {}", args.output.display()))?;

    let (peak, rms) = peak_and_rms(dst_format, &out);
    println!(
        "{} -> {}: {} Hz/{} ch -> {} Hz/{} ch",
        args.input.display(),
        args.output.display(),
        src_spec.freq,
        src_spec.channels,
        dst_spec.freq,
        dst_spec.channels,
    );
    println!(
        "peak {:.2} dBFS, rms {:.2} dBFS ({} bytes written)",
        linear_to_db(peak),
        linear_to_db(rms),
        out.len()
    );

    Ok(())
}

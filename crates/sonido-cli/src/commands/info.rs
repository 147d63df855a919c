//! `sonido info` - print a WAV file's format, channel count, and sample rate.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;

use crate::wav;

#[derive(Args)]
pub struct InfoArgs {
    /// WAV file to inspect
    pub input: PathBuf,
}

pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let (spec, data) =
        wav::read(&args.input).with_context(|| format!("reading {}", args.input.display()))?;

    let frames = spec.bytes_to_frames(data.len());
    let seconds = frames as f64 / spec.freq as f64;

    println!("{}", args.input.display());
    println!("  format:      {}", spec.format);
    println!("  channels:    {}", spec.channels);
    println!("  sample rate: {} Hz", spec.freq);
    println!("  frames:      {frames}");
    println!("  duration:    {seconds:.3} s");
    println!("  bytes:       {}", data.len());

    Ok(())
}

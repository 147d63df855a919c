//! Minimal WAV codec for the demo harness.
//!
//! Lives here, outside `sonido-core`/`sonido-stream`, exactly as an external
//! collaborator of the stream engine: it hands the engine raw PCM bytes and
//! an [`AudioSpec`] and does nothing else with them.

use std::path::Path;

use anyhow::{bail, Context};
use sonido_core::{AudioFormatTag, AudioSpec};

/// Read a WAV file's spec and its samples as raw bytes in the matching
/// [`AudioFormatTag`].
pub fn read(path: &Path) -> anyhow::Result<(AudioSpec, Vec<u8>)> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("opening {}", path.display()))?;
    let hspec = reader.spec();

    let format = match (hspec.sample_format, hspec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => AudioFormatTag::F32LE,
        (hound::SampleFormat::Int, 16) => AudioFormatTag::S16LE,
        (hound::SampleFormat::Int, 32) => AudioFormatTag::S32LE,
        (fmt, bits) => bail!("unsupported WAV sample format: {fmt:?}/{bits}-bit"),
    };
    let spec = AudioSpec::new(format, hspec.channels as u8, hspec.sample_rate as i32)?;

    let bytes = match format {
        AudioFormatTag::F32LE => reader
            .samples::<f32>()
            .flat_map(|s| s.expect("sample read").to_le_bytes())
            .collect(),
        AudioFormatTag::S16LE => reader
            .samples::<i16>()
            .flat_map(|s| s.expect("sample read").to_le_bytes())
            .collect(),
        AudioFormatTag::S32LE => reader
            .samples::<i32>()
            .flat_map(|s| s.expect("sample read").to_le_bytes())
            .collect(),
        _ => unreachable!("validated above"),
    };
    Ok((spec, bytes))
}

/// Write raw PCM `bytes` (in `spec`'s format) as a WAV file.
pub fn write(path: &Path, spec: AudioSpec, bytes: &[u8]) -> anyhow::Result<()> {
    let (sample_format, bits_per_sample) = match spec.format {
        AudioFormatTag::F32LE => (hound::SampleFormat::Float, 32),
        AudioFormatTag::S16LE => (hound::SampleFormat::Int, 16),
        AudioFormatTag::S32LE => (hound::SampleFormat::Int, 32),
        other => bail!("unsupported output format for WAV writing: {other}"),
    };
    let hspec = hound::WavSpec {
        channels: spec.channels as u16,
        sample_rate: spec.freq as u32,
        bits_per_sample,
        sample_format,
    };
    let mut writer = hound::WavWriter::create(path, hspec)
        .with_context(|| format!("creating {}", path.display()))?;

    match spec.format {
        AudioFormatTag::F32LE => {
            for chunk in bytes.chunks_exact(4) {
                writer.write_sample(f32::from_le_bytes(chunk.try_into()?))?;
            }
        }
        AudioFormatTag::S16LE => {
            for chunk in bytes.chunks_exact(2) {
                writer.write_sample(i16::from_le_bytes(chunk.try_into()?))?;
            }
        }
        AudioFormatTag::S32LE => {
            for chunk in bytes.chunks_exact(4) {
                writer.write_sample(i32::from_le_bytes(chunk.try_into()?))?;
            }
        }
        _ => unreachable!("validated above"),
    }
    writer.finalize()?;
    Ok(())
}

//! Criterion benchmarks for sonido-core's format-conversion and resampling
//! hot paths.
//!
//! Run with: cargo bench -p sonido-core
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sonido_core::{AudioFormatTag, AudioSpec, Resampler, convert_audio};

const BLOCK_SIZES: &[usize] = &[64, 256, 1024, 4096];

fn generate_s16_frames(channels: u8, frames: usize) -> Vec<u8> {
    (0..frames * channels as usize)
        .flat_map(|i| {
            let t = i as f32 / 44_100.0;
            let s = (2.0 * std::f32::consts::PI * 440.0 * t).sin();
            ((s * i16::MAX as f32) as i16).to_le_bytes()
        })
        .collect()
}

fn generate_f32_frames(channels: u8, frames: usize) -> Vec<f32> {
    (0..frames * channels as usize)
        .map(|i| {
            let t = i as f32 / 44_100.0;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_convert_identity(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_audio/identity");
    let spec = AudioSpec::new(AudioFormatTag::S16LE, 2, 44_100).unwrap();

    for &block_size in BLOCK_SIZES {
        let input = generate_s16_frames(2, block_size);
        let mut output = vec![0u8; input.len()];

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                convert_audio(black_box(&spec), black_box(&spec), black_box(&input), &mut output).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_convert_format_and_channels(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_audio/format_and_channels");
    let src = AudioSpec::new(AudioFormatTag::S16LE, 1, 44_100).unwrap();
    let dst = AudioSpec::new(AudioFormatTag::F32LE, 2, 44_100).unwrap();

    for &block_size in BLOCK_SIZES {
        let input = generate_s16_frames(1, block_size);
        let mut output = vec![0u8; block_size * 2 * 4];

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                convert_audio(black_box(&src), black_box(&dst), black_box(&input), &mut output).unwrap();
            });
        });
    }

    group.finish();
}

fn bench_resample_upsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resampler/upsample_2x");

    for &block_size in BLOCK_SIZES {
        let input = generate_f32_frames(1, block_size);
        let mut output = vec![0f32; block_size * 2 + 64];

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                let mut resampler = Resampler::new(1, 22_050, 44_100);
                black_box(resampler.process(black_box(&input), &mut output));
            });
        });
    }

    group.finish();
}

fn bench_resample_downsample(c: &mut Criterion) {
    let mut group = c.benchmark_group("resampler/downsample_2x");

    for &block_size in BLOCK_SIZES {
        let input = generate_f32_frames(1, block_size);
        let mut output = vec![0f32; block_size / 2 + 64];

        group.bench_with_input(BenchmarkId::from_parameter(block_size), &block_size, |b, _| {
            b.iter(|| {
                let mut resampler = Resampler::new(1, 44_100, 22_050);
                black_box(resampler.process(black_box(&input), &mut output));
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_convert_identity,
    bench_convert_format_and_channels,
    bench_resample_upsample,
    bench_resample_downsample,
);

criterion_main!(benches);

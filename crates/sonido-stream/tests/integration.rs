//! End-to-end scenarios for the audio stream engine.

use sonido_core::{AudioFormatTag, AudioSpec};
use sonido_stream::AudioStream;

fn spec(format: AudioFormatTag, channels: u8, freq: i32) -> AudioSpec {
    AudioSpec::new(format, channels, freq).unwrap()
}

fn sine_i16(freq_hz: f32, sample_rate: i32, n: usize) -> Vec<u8> {
    (0..n)
        .flat_map(|i| {
            let t = i as f32 / sample_rate as f32;
            let s = (2.0 * std::f32::consts::PI * freq_hz * t).sin();
            ((s * 32767.0) as i16).to_le_bytes()
        })
        .collect()
}

/// Same format in and out: `Get` returns exactly what was `Put`.
#[test]
fn identity_stream_is_a_pass_through() {
    let s = spec(AudioFormatTag::S16LE, 2, 44_100);
    let stream = AudioStream::with_format(s, s).unwrap();

    let data = sine_i16(440.0, 44_100, 1000);
    stream.put(&data).unwrap();

    let mut out = vec![0u8; data.len()];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, data.len());
    assert_eq!(out, data);
}

/// Format-only conversion (no rate/channel change): byte width changes,
/// frame count is preserved.
#[test]
fn format_only_conversion_preserves_frame_count() {
    let src = spec(AudioFormatTag::S16LE, 1, 44_100);
    let dst = spec(AudioFormatTag::F32LE, 1, 44_100);
    let stream = AudioStream::with_format(src, dst).unwrap();

    let frames = 500;
    let data = sine_i16(440.0, 44_100, frames);
    stream.put(&data).unwrap();

    let mut out = vec![0u8; frames * 4];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, frames * 4);
}

/// Channel-only conversion: mono in, stereo out, same frame count.
#[test]
fn mono_to_stereo_duplicates_every_frame() {
    let src = spec(AudioFormatTag::F32LE, 1, 44_100);
    let dst = spec(AudioFormatTag::F32LE, 2, 44_100);
    let stream = AudioStream::with_format(src, dst).unwrap();

    let samples = vec![0.25f32; 10];
    let data: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
    stream.put(&data).unwrap();

    let mut out = vec![0u8; 10 * 2 * 4];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, out.len());

    for frame in out.chunks_exact(8) {
        let left = f32::from_le_bytes(frame[0..4].try_into().unwrap());
        let right = f32::from_le_bytes(frame[4..8].try_into().unwrap());
        assert!((left - 0.25).abs() < 1e-6);
        assert!((right - 0.25).abs() < 1e-6);
    }
}

/// Resampling: upsampling produces more frames than were put in.
#[test]
fn upsampling_produces_more_frames_than_were_put() {
    let src = spec(AudioFormatTag::F32LE, 1, 22_050);
    let dst = spec(AudioFormatTag::F32LE, 1, 44_100);
    let stream = AudioStream::with_format(src, dst).unwrap();

    let input_frames = 512;
    let data: Vec<u8> = (0..input_frames)
        .flat_map(|_| 0.1f32.to_le_bytes())
        .collect();
    stream.put(&data).unwrap();
    stream.flush();

    let mut out = vec![0u8; input_frames * 2 * 4];
    let mut total_frames = 0;
    loop {
        let n = stream.get(&mut out).unwrap();
        if n == 0 {
            break;
        }
        total_frames += n / 4;
    }
    assert!(total_frames > input_frames);
}

/// A spec change between two `Put` calls ends the current track; `Get`
/// drains the old track's data before picking up the new spec's.
#[test]
fn changing_input_spec_mid_stream_segments_the_queue() {
    let dst = spec(AudioFormatTag::S16LE, 1, 44_100);
    let stream = AudioStream::new();
    stream.set_format(Some(spec(AudioFormatTag::S16LE, 1, 44_100)), Some(dst)).unwrap();
    stream.put(&[1u8, 0, 2, 0]).unwrap();

    stream.set_format(Some(spec(AudioFormatTag::S16LE, 1, 48_000)), None).unwrap();
    stream.put(&[3u8, 0, 4, 0]).unwrap();

    let mut out = vec![0u8; 4];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, 4);
    assert_eq!(out, vec![1u8, 0, 2, 0], "first track must drain before the resampled second track appears");
}

/// `Flush` ends a track even when the spec hasn't changed, so two `Put`
/// calls with identical specs still produce two tracks.
#[test]
fn flush_ends_a_track_without_a_spec_change() {
    let s = spec(AudioFormatTag::S16LE, 1, 44_100);
    let stream = AudioStream::with_format(s, s).unwrap();

    stream.put(&[1u8, 0]).unwrap();
    stream.flush();
    stream.put(&[2u8, 0]).unwrap();

    assert_eq!(stream.queued(), 4);
    let mut out = vec![0u8; 4];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, 4);
    assert_eq!(out, vec![1u8, 0, 2u8, 0]);
}

/// `Clear` drops queued data immediately, independent of track boundaries.
#[test]
fn clear_drops_everything_regardless_of_tracks() {
    let s = spec(AudioFormatTag::S16LE, 1, 44_100);
    let stream = AudioStream::with_format(s, s).unwrap();
    stream.put(&[1u8, 0]).unwrap();
    stream.flush();
    stream.put(&[2u8, 0]).unwrap();

    stream.clear();
    assert_eq!(stream.queued(), 0);

    let mut out = vec![0u8; 4];
    let n = stream.get(&mut out).unwrap();
    assert_eq!(n, 0);
}

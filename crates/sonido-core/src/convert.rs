//! Format and channel conversion.
//!
//! Ported from `ConvertAudio` in `SDL_audiocvt.c`: byteswap to native order,
//! widen to `f32`, remap channels, narrow back to the destination format,
//! byteswap to the destination's order. Each stage is skipped when it would
//! be a no-op, and the whole pipeline short-circuits to a `memcpy`-equivalent
//! when source and destination specs are identical.

use core::fmt;

use crate::format::{AudioFormatTag, AudioSpec, MAX_CHANNELS};

/// Errors converting between two [`AudioSpec`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertError {
    /// The input buffer's length isn't a whole number of source frames.
    UnalignedInput { len: usize, frame_size: u32 },
    /// The caller's output buffer is too small to hold the converted frames.
    OutputTooSmall { needed: usize, provided: usize },
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnalignedInput { len, frame_size } => write!(
                f,
                "input buffer of {len} bytes is not a multiple of the frame size {frame_size}"
            ),
            Self::OutputTooSmall { needed, provided } => {
                write!(f, "output buffer needs {needed} bytes, got {provided}")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConvertError {}

/// Upper bound on the output byte size of converting `input_frames` frames
/// from `src` to `dst`, matching `CalculateMaxFrameSize`'s role of sizing
/// scratch/work buffers before a conversion.
#[must_use]
pub fn max_frame_size(src: &AudioSpec, dst: &AudioSpec, input_frames: usize) -> usize {
    input_frames * (src.frame_size() as usize).max(dst.frame_size() as usize)
}

/// Convert `input` (in `src`'s format) into `output` (in `dst`'s format).
///
/// `input` must hold a whole number of `src` frames. `output` must be at
/// least `dst.frames_to_bytes(src.bytes_to_frames(input.len()))` bytes; the
/// function writes exactly that many bytes and returns the count.
///
/// # Errors
///
/// Returns [`ConvertError::UnalignedInput`] if `input.len()` isn't a multiple
/// of `src.frame_size()`, or [`ConvertError::OutputTooSmall`] if `output`
/// can't hold the converted frames.
pub fn convert_audio(
    src: &AudioSpec,
    dst: &AudioSpec,
    input: &[u8],
    output: &mut [u8],
) -> Result<usize, ConvertError> {
    let frame_size = src.frame_size() as usize;
    if frame_size == 0 || input.len() % frame_size != 0 {
        return Err(ConvertError::UnalignedInput {
            len: input.len(),
            frame_size: src.frame_size(),
        });
    }
    let frames = input.len() / frame_size;
    let needed = dst.frames_to_bytes(frames);
    if output.len() < needed {
        return Err(ConvertError::OutputTooSmall {
            needed,
            provided: output.len(),
        });
    }

    // Fast path: identical specs, byte-for-byte copy.
    if src == dst {
        output[..needed].copy_from_slice(&input[..needed]);
        return Ok(needed);
    }

    // Fast path: same format and channel count, only byte order differs.
    if src.format.byte_size() == dst.format.byte_size()
        && src.format.is_float() == dst.format.is_float()
        && src.format.is_signed() == dst.format.is_signed()
        && src.channels == dst.channels
        && src.format.is_big_endian() != dst.format.is_big_endian()
    {
        byteswap_into(src.format.byte_size(), input, &mut output[..needed]);
        return Ok(needed);
    }

    let channels = src.channels.max(dst.channels) as usize;
    let mut frame_buf = [0f32; MAX_CHANNELS as usize];

    for i in 0..frames {
        let in_frame = &input[i * frame_size..(i + 1) * frame_size];
        to_float(src.format, src.channels, in_frame, &mut frame_buf);
        remap_channels(src.channels, dst.channels, &mut frame_buf);
        let out_frame =
            &mut output[i * dst.frame_size() as usize..(i + 1) * dst.frame_size() as usize];
        from_float(dst.format, dst.channels, &frame_buf[..channels], out_frame);
    }

    Ok(needed)
}

/// Byteswap `width`-byte samples from `input` into `output` (same length).
fn byteswap_into(width: u32, input: &[u8], output: &mut [u8]) {
    match width {
        2 => {
            for (i, o) in input.chunks_exact(2).zip(output.chunks_exact_mut(2)) {
                o[0] = i[1];
                o[1] = i[0];
            }
        }
        4 => {
            for (i, o) in input.chunks_exact(4).zip(output.chunks_exact_mut(4)) {
                o[0] = i[3];
                o[1] = i[2];
                o[2] = i[1];
                o[3] = i[0];
            }
        }
        _ => output.copy_from_slice(input),
    }
}

/// Widen one frame of `channels` samples in `format` to `f32` in `[-1.0, 1.0]`.
fn to_float(format: AudioFormatTag, channels: u8, frame: &[u8], out: &mut [f32]) {
    for c in 0..channels as usize {
        let byte_size = format.byte_size() as usize;
        let raw = &frame[c * byte_size..(c + 1) * byte_size];
        out[c] = sample_to_float(format, raw);
    }
}

fn sample_to_float(format: AudioFormatTag, raw: &[u8]) -> f32 {
    match format {
        AudioFormatTag::U8 => (raw[0] as f32 - 128.0) / 128.0,
        AudioFormatTag::S8 => raw[0] as i8 as f32 / 128.0,
        AudioFormatTag::S16LE | AudioFormatTag::S16BE => {
            let mut bytes = [0u8; 2];
            bytes.copy_from_slice(raw);
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            i16::from_ne_bytes(bytes) as f32 / 32768.0
        }
        AudioFormatTag::S32LE | AudioFormatTag::S32BE => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(raw);
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            i32::from_ne_bytes(bytes) as f32 / 2_147_483_648.0
        }
        AudioFormatTag::F32LE | AudioFormatTag::F32BE => {
            let mut bytes = [0u8; 4];
            bytes.copy_from_slice(raw);
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            f32::from_ne_bytes(bytes)
        }
    }
}

/// Narrow one frame of `f32` samples back to `format`, writing `channels` samples.
fn from_float(format: AudioFormatTag, channels: u8, frame: &[f32], out: &mut [u8]) {
    let byte_size = format.byte_size() as usize;
    for c in 0..channels as usize {
        let v = frame[c].clamp(-1.0, 1.0);
        let raw = &mut out[c * byte_size..(c + 1) * byte_size];
        float_to_sample(format, v, raw);
    }
}

fn float_to_sample(format: AudioFormatTag, v: f32, raw: &mut [u8]) {
    match format {
        AudioFormatTag::U8 => raw[0] = ((v * 128.0) + 128.0).round() as u8,
        AudioFormatTag::S8 => raw[0] = (v * 128.0).round() as i8 as u8,
        AudioFormatTag::S16LE | AudioFormatTag::S16BE => {
            let s = (v * 32768.0).round().clamp(-32768.0, 32767.0) as i16;
            let mut bytes = s.to_ne_bytes();
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            raw.copy_from_slice(&bytes);
        }
        AudioFormatTag::S32LE | AudioFormatTag::S32BE => {
            let s = (v * 2_147_483_648.0).round().clamp(-2_147_483_648.0, 2_147_483_647.0) as i32;
            let mut bytes = s.to_ne_bytes();
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            raw.copy_from_slice(&bytes);
        }
        AudioFormatTag::F32LE | AudioFormatTag::F32BE => {
            let mut bytes = v.to_ne_bytes();
            if format.is_big_endian() != cfg!(target_endian = "big") {
                bytes.reverse();
            }
            raw.copy_from_slice(&bytes);
        }
    }
}

/// Remap a frame in-place from `src_channels` to `dst_channels`, a
/// `remap[src-1][dst-1]` dispatch table mirroring `SDL_audiocvt.c`'s
/// `channel_converters`. Named per the channel-order table (FL, FR, FC,
/// LFE, BL, BR, ...): mono's sole channel is FC, so fanning it out to a
/// 5.1/7.1 layout places it in the FC slot (index 2), not FL; the inverse
/// 5.1/7.1-to-stereo downmixes mix FC and LFE into both L and R rather than
/// routing them to one side. Pairs with no dedicated rule fall back to a
/// symmetric zero-fill (upmix) or even distribution (downmix).
fn remap_channels(src_channels: u8, dst_channels: u8, frame: &mut [f32; MAX_CHANNELS as usize]) {
    match (src_channels, dst_channels) {
        (s, d) if s == d => {}
        (1, 2) => frame[1] = frame[0],
        (2, 1) => frame[0] = (frame[0] + frame[1]) * 0.5,
        (1, 6) | (1, 8) => {
            let center = frame[0];
            frame[0] = 0.0;
            frame[1] = 0.0;
            frame[2] = center;
            for c in 3..dst_channels as usize {
                frame[c] = 0.0;
            }
        }
        (6, 2) => {
            let (fl, fr, fc, lfe) = (frame[0], frame[1], frame[2], frame[3]);
            let center = (fc + lfe) * 0.5;
            frame[0] = fl + center;
            frame[1] = fr + center;
        }
        (8, 2) => {
            let (fl, fr, fc, lfe, bl, br, sl, sr) = (
                frame[0], frame[1], frame[2], frame[3], frame[4], frame[5], frame[6], frame[7],
            );
            let center = (fc + lfe) * 0.5;
            frame[0] = fl + center + 0.5 * (bl + sl);
            frame[1] = fr + center + 0.5 * (br + sr);
        }
        (s, d) if d > s => {
            for c in s as usize..d as usize {
                frame[c] = 0.0;
            }
        }
        (s, d) if d < s => {
            // Spread every source channel beyond `d` evenly across all
            // destination channels instead of folding it into whichever one
            // shares its index modulo `d`, which would weight destinations
            // unevenly depending on `s` and `d`.
            let extra: f32 = frame[d as usize..s as usize].iter().sum();
            let share = extra / d as f32;
            for c in 0..d as usize {
                frame[c] += share;
            }
        }
        _ => {}
    }
}

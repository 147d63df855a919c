//! Sonido Core - format, channel, and resampling primitives for the audio stream engine
//!
//! This crate provides the format-agnostic building blocks that
//! [`sonido-stream`](https://docs.rs/sonido-stream) assembles into a full
//! producer/consumer audio stream: describing a PCM layout, converting
//! between layouts, and resampling between sample rates while preserving
//! phase continuity across calls.
//!
//! # Core Abstractions
//!
//! - [`AudioFormatTag`] / [`AudioSpec`] - the `(format, channels, freq)`
//!   contract a stream's input and output sides each carry.
//! - [`convert_audio`] - byteswap → integer↔float → channel remap, table-driven
//!   with a mandatory scalar fallback for every step.
//! - [`Resampler`] - windowed-sinc bandlimited interpolation, driven by a
//!   32.32 fixed-point phase accumulator so it can be called repeatedly
//!   across a producer/consumer boundary without losing sub-sample phase.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded use. Disable the default
//! `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sonido-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: no allocations in the converter or resampler hot
//!   paths; callers own all scratch buffers.
//! - **No dependencies on std**: pure `no_std` with `libm` for math.
//! - **Scalar-first**: every fast path is auto-vectorizable safe scalar code,
//!   not raw SIMD intrinsics, with a guaranteed-correct scalar fallback.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod convert;
pub mod format;
pub mod resampler;

pub use convert::{ConvertError, convert_audio, max_frame_size};
pub use format::{AudioFormatTag, AudioSpec, CHANNEL_LAYOUTS, MAX_CHANNELS, SpecError};
pub use resampler::{
    PADDING_FRAMES, Resampler, SAMPLES_PER_ZERO_CROSSING, ZERO_CROSSINGS, available_output_frames,
    needed_input_frames, resample_rate,
};

//! Error types for the audio stream engine.

use sonido_core::SpecError;

/// Errors constructing or operating an [`crate::stream::AudioStream`].
#[derive(Debug, thiserror::Error)]
pub enum StreamError {
    /// A format/channel/frequency spec failed validation.
    #[error("invalid stream spec: {0}")]
    InvalidSpec(#[from] SpecError),

    /// `Put`/`Get` was called before both the input and output specs were set.
    #[error("stream spec not set: {0}")]
    SpecUnset(&'static str),

    /// A frequency ratio outside the supported range was requested.
    #[error("invalid frequency ratio {0} (must be {1}..={2})")]
    InvalidFrequencyRatio(f64, f64, f64),

    /// A byte buffer's length wasn't a whole number of frames in its spec.
    #[error("unaligned buffer: {len} bytes is not a multiple of the {frame_size}-byte frame")]
    UnalignedBuffer { len: usize, frame_size: u32 },

    /// Chunk/track allocation failed. Unreachable on a normal allocator, but
    /// kept as an explicit error so the rollback path it feeds has somewhere
    /// to report to.
    #[error("out of memory while queuing audio data")]
    OutOfMemory,
}

/// Convenience result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;

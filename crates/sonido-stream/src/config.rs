//! Tunable constants for the queue and stream.
//!
//! Named constants rather than a TOML-backed configuration crate — unlike
//! the workspace's preset system, nothing here is persisted between runs.
//! Per-instance overrides (chunk size) are exposed as constructor arguments
//! on [`crate::stream::AudioStream`]; the rest are fixed properties of the
//! algorithm they support.

/// Default chunk capacity in bytes, used when a stream doesn't request a
/// custom size. Large enough to amortize allocation, small enough that a
/// `Flush` mid-chunk doesn't waste much space.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// Maximum number of emptied chunks kept around for reuse instead of being
/// dropped. Matches the original implementation's small fixed-size free list.
pub const MAX_FREE_CHUNKS: usize = 4;

/// Puts at or above this size bypass the incremental per-chunk append path
/// and build their chunk run before acquiring the stream's lock.
pub const LARGE_PUT_THRESHOLD: usize = 64 * 1024;

/// Valid range for a stream's frequency ratio (`SetFrequencyRatio`).
pub const MIN_FREQUENCY_RATIO: f64 = 0.01;
pub const MAX_FREQUENCY_RATIO: f64 = 100.0;

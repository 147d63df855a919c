//! Fixed-capacity byte chunks, the queue's storage unit.
//!
//! Ported from `SDL_AudioChunk`/`CreateAudioChunks` in the original
//! implementation: chunks are allocated at a fixed capacity and filled
//! incrementally for small writes, or built as a whole run ahead of time for
//! large ones so the run can be spliced into the queue in one step.

use std::collections::VecDeque;

/// A single fixed-capacity buffer of queued audio bytes.
///
/// `buf.len()` is how much of `buf` has been written; the chunk's capacity
/// is `buf.capacity()`. `read_pos` tracks how much of the written portion
/// has already been consumed by `Get`.
#[derive(Debug)]
pub struct Chunk {
    buf: Vec<u8>,
    read_pos: usize,
}

impl Chunk {
    /// Allocate an empty chunk with room for `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            read_pos: 0,
        }
    }

    /// Reuse a previously-emptied chunk, discarding its contents but keeping
    /// its allocation. Matches the free-chunk recycler in `WriteToAudioQueue`.
    pub fn recycle(&mut self) {
        self.buf.clear();
        self.read_pos = 0;
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    #[must_use]
    pub fn written(&self) -> usize {
        self.buf.len()
    }

    #[must_use]
    pub fn remaining_write_capacity(&self) -> usize {
        self.buf.capacity() - self.buf.len()
    }

    /// Bytes still available to read from this chunk.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buf.len() - self.read_pos
    }

    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.read_pos >= self.buf.len()
    }

    /// Append as much of `data` as fits in the remaining capacity. Returns
    /// the number of bytes actually written.
    pub fn write(&mut self, data: &[u8]) -> usize {
        let n = data.len().min(self.remaining_write_capacity());
        self.buf.extend_from_slice(&data[..n]);
        n
    }

    /// Copy available bytes into `out` without consuming them. Returns the
    /// number of bytes copied.
    #[must_use]
    pub fn peek(&self, out: &mut [u8]) -> usize {
        let n = out.len().min(self.available());
        out[..n].copy_from_slice(&self.buf[self.read_pos..self.read_pos + n]);
        n
    }

    /// Copy available bytes into `out`, consuming them. Returns the number
    /// of bytes read.
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let n = self.peek(out);
        self.read_pos += n;
        n
    }

}

/// Split `data` into a run of fixed-capacity chunks, filling every chunk but
/// the last to capacity. Intended to run *before* the queue's lock is taken
/// for large puts, so the lock only has to splice the finished run in.
#[must_use]
pub fn build_chunks(data: &[u8], chunk_size: usize) -> VecDeque<Chunk> {
    debug_assert!(chunk_size > 0);
    let mut chunks = VecDeque::with_capacity(data.len().div_ceil(chunk_size));
    for piece in data.chunks(chunk_size) {
        let mut chunk = Chunk::new(chunk_size);
        let written = chunk.write(piece);
        debug_assert_eq!(written, piece.len());
        chunks.push_back(chunk);
    }
    chunks
}

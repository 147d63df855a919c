//! Track-segmented chunk queue.
//!
//! Ported from `SDL_AudioQueue` and its `WriteToAudioQueue`/
//! `WriteChunksToAudioQueue`/`ReadFromAudioQueue`/`PeekIntoAudioQueue`/
//! `FlushAudioQueue`/`PopCurrentAudioTrack` functions in the original
//! implementation. A queue is an ordered list of [`Track`]s, each
//! spec-homogeneous; chunks emptied by reads are recycled into a small
//! bounded pool instead of being freed, since drained chunks on one end and
//! allocations on the other happen at roughly the same rate in steady state.

use std::collections::VecDeque;

use sonido_core::AudioSpec;

use crate::chunk::{Chunk, build_chunks};
use crate::config::MAX_FREE_CHUNKS;
use crate::track::Track;

/// Ordered, spec-segmented queue of not-yet-consumed audio bytes.
pub struct Queue {
    tracks: VecDeque<Track>,
    free_chunks: Vec<Chunk>,
    chunk_size: usize,
}

impl Queue {
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            tracks: VecDeque::new(),
            free_chunks: Vec::with_capacity(MAX_FREE_CHUNKS),
            chunk_size,
        }
    }

    /// Total unread bytes across every track in the queue.
    #[must_use]
    pub fn queued_bytes(&self) -> usize {
        self.tracks.iter().map(Track::available).sum()
    }

    /// Unread bytes in the front (currently-being-consumed) track only.
    #[must_use]
    pub fn front_track_available(&self) -> usize {
        self.tracks.front().map_or(0, Track::available)
    }

    #[must_use]
    pub fn front_track_spec(&self) -> Option<AudioSpec> {
        self.tracks.front().map(|t| t.spec)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    fn tail_track_mut(&mut self, spec: AudioSpec) -> &mut Track {
        let needs_new = self
            .tracks
            .back()
            .is_none_or(|t| t.flushed() || t.spec != spec);
        if needs_new {
            // A spec change seals off the old tail even without an explicit
            // `flush`: it will never receive another write, since writes
            // only ever target the current tail.
            if let Some(old_tail) = self.tracks.back_mut() {
                old_tail.mark_flushed();
            }
            self.tracks.push_back(Track::new(spec));
        }
        self.tracks.back_mut().expect("just ensured a tail track")
    }

    /// Small-put path: append `data` incrementally, allocating/recycling
    /// chunks as it goes. Called while the queue's lock is held.
    pub fn write_small(&mut self, spec: AudioSpec, data: &[u8]) {
        if data.is_empty() {
            return;
        }
        let chunk_size = self.chunk_size;
        self.tail_track_mut(spec)
            .write_incremental(data, chunk_size, &mut self.free_chunks);
    }

    /// Large-put path: splice an already-built run of full chunks into the
    /// tail track. `built` should come from [`build_chunks`], constructed
    /// *before* the queue's lock was acquired.
    pub fn write_chunks(&mut self, spec: AudioSpec, built: VecDeque<Chunk>) {
        if built.is_empty() {
            return;
        }
        self.tail_track_mut(spec).splice_chunks(built);
    }

    /// Build and splice in one call, for callers that don't need to split
    /// the build and splice across a lock boundary (tests, the one-shot
    /// convenience helper).
    pub fn write_bulk(&mut self, spec: AudioSpec, data: &[u8]) {
        let built = build_chunks(data, self.chunk_size);
        self.write_chunks(spec, built);
    }

    /// Read up to `out.len()` bytes from the front track, popping it once
    /// drained. Stops at the front track's boundary even if `out` has room
    /// for more — the caller decides whether to continue into the next
    /// track (it may have a different spec needing a fresh conversion pass).
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let Some(front) = self.tracks.front_mut() else {
            return 0;
        };
        let n = front.read(out, &mut self.free_chunks, MAX_FREE_CHUNKS);
        self.pop_front_if_empty();
        n
    }

    /// Copy up to `out.len()` bytes from the front track without consuming them.
    #[must_use]
    pub fn peek(&self, out: &mut [u8]) -> usize {
        self.tracks.front().map_or(0, |t| t.peek(out))
    }

    /// Pop the front track if it's both flushed and fully drained. Returns
    /// `true` if a track was popped (the caller may need to reset resampler
    /// history). A track that's merely momentarily empty but not yet
    /// flushed stays put so a lagging producer can resume writing into it.
    pub fn pop_front_if_empty(&mut self) -> bool {
        if self.tracks.front().is_some_and(Track::is_done) {
            self.tracks.pop_front();
            true
        } else {
            false
        }
    }

    /// End the current track immediately: it's marked flushed right away
    /// (so it can be popped as soon as it drains) and the next write starts
    /// a new one even with an identical spec. Matches `FlushAudioQueue`.
    pub fn flush(&mut self) {
        if let Some(tail) = self.tracks.back_mut() {
            tail.mark_flushed();
        }
    }

    /// Discard every track and recycle their chunks.
    pub fn clear(&mut self) {
        while let Some(mut track) = self.tracks.pop_front() {
            track.clear(&mut self.free_chunks, MAX_FREE_CHUNKS);
        }
    }
}

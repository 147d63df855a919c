//! The audio stream: a producer/consumer queue that converts and resamples
//! between an input spec and an output spec as data flows through it.
//!
//! Ported from `SDL_AudioStream` and its operations in
//! `SDL_audiocvt.c` — `SDL_CreateAudioStream`, `SDL_PutAudioStreamData`,
//! `SDL_GetAudioStreamData`, `SDL_FlushAudioStream`, `SDL_ClearAudioStream`,
//! the format/frequency-ratio setters and getters, and the get/put callback
//! slots. The recursive lock is `parking_lot::ReentrantMutex` wrapping a
//! `RefCell`, so the same thread can call back into `Put`/`Get` from inside
//! a callback invoked with the lock held without deadlocking.

use std::cell::RefCell;

use parking_lot::ReentrantMutex;
use sonido_core::{AudioFormatTag, AudioSpec, Resampler, convert_audio};
use tracing::{debug, trace, warn};

use crate::chunk::build_chunks;
use crate::config::{DEFAULT_CHUNK_SIZE, LARGE_PUT_THRESHOLD, MAX_FREQUENCY_RATIO, MIN_FREQUENCY_RATIO};
use crate::error::{Result, StreamError};
use crate::queue::Queue;

/// Opaque handle to a bound playback/capture device.
///
/// Device enumeration and opening live outside this crate (they're
/// OS-backend concerns); a stream only remembers which device ID it's
/// bound to so a higher-level mixer can route it.
pub type DeviceId = u32;

/// Signature for the get-callback: invoked at most once per `Get`, before
/// any pulling happens, when the queue can't already satisfy the request.
/// `needed_bytes` is a conservative estimate in the *input* spec's bytes —
/// how much more `Put` data the callback should supply.
pub type GetCallback = Box<dyn FnMut(&AudioStream, usize) + Send>;

/// Signature for the put-callback: invoked (with the lock held) after `Put`
/// appends new data, skipped when the put added zero output-side bytes.
/// `bytes_added` is the increase in [`AudioStream::available`] the put
/// caused, in the *output* spec's bytes — not the raw input byte count.
pub type PutCallback = Box<dyn FnMut(&AudioStream, usize) + Send>;

struct State {
    input_spec: Option<AudioSpec>,
    output_spec: Option<AudioSpec>,
    freq_ratio: f64,
    queue: Queue,
    resampler: Option<Resampler>,
    resampler_key: Option<(u8, i32, i32)>,
    bound_device: Option<DeviceId>,
    get_callback: Option<GetCallback>,
    put_callback: Option<PutCallback>,
    float_buffer: Vec<f32>,
}

impl State {
    fn new(chunk_size: usize) -> Self {
        Self {
            input_spec: None,
            output_spec: None,
            freq_ratio: 1.0,
            queue: Queue::new(chunk_size),
            resampler: None,
            resampler_key: None,
            bound_device: None,
            get_callback: None,
            put_callback: None,
            float_buffer: Vec::new(),
        }
    }

    /// (Re)build the resampler if the effective `(channels, src_freq, dst_freq)`
    /// triple changed, preserving it (and its phase/history) otherwise.
    /// Matches `SDL_SetupAudioResampler`'s one-time-unless-format-changes
    /// guard, except `input` is the spec of whatever's actually about to be
    /// converted (the currently-draining track's own recorded spec in
    /// `pull_one`, not a single stream-wide cached input spec) so a
    /// `SetFormat` call doesn't retune the resampler out from under a track
    /// that was queued under the old spec and hasn't drained yet. Returns
    /// whether resampling is needed at all for this `input`.
    fn ensure_resampler(&mut self, input: AudioSpec) -> bool {
        let Some(output) = self.output_spec else {
            self.resampler = None;
            self.resampler_key = None;
            return false;
        };
        let effective_dst_freq = (output.freq as f64 / self.freq_ratio).round() as i32;
        if input.freq == effective_dst_freq {
            self.resampler = None;
            self.resampler_key = None;
            return false;
        }
        let channels = output.channels;
        let key = (channels, input.freq, effective_dst_freq);
        if self.resampler_key != Some(key) {
            debug!(?key, "rebuilding resampler");
            self.resampler = Some(Resampler::new(channels, input.freq, effective_dst_freq));
            self.resampler_key = Some(key);
        }
        true
    }

    /// Sync the resampler against the stream-wide input spec. Called from
    /// `set_format`/`set_frequency_ratio` so a resampler is ready the moment
    /// data starts flowing; `pull_one` re-syncs it per-track before using it,
    /// which is the instance that actually governs conversion correctness.
    fn sync_resampler(&mut self) {
        match self.input_spec {
            Some(input) => {
                self.ensure_resampler(input);
            }
            None => {
                self.resampler = None;
                self.resampler_key = None;
            }
        }
    }

    /// Output frames available from the currently-set input/output specs,
    /// without regard to which track is actually at the front of the queue.
    /// A best-effort estimate when resampling is in effect.
    fn available_output_frames(&self, output_spec: AudioSpec) -> usize {
        let Some(input_spec) = self.input_spec else {
            return 0;
        };
        let queued = self.queue.queued_bytes();
        if input_spec == output_spec {
            return queued / output_spec.frame_size().max(1) as usize;
        }
        let input_frames = queued / input_spec.frame_size().max(1) as usize;
        match &self.resampler {
            Some(r) => r.available_output(input_frames),
            None => input_frames,
        }
    }

    /// Output bytes available from the currently-set input/output specs.
    fn available_bytes(&self) -> usize {
        let Some(output_spec) = self.output_spec else {
            return 0;
        };
        self.available_output_frames(output_spec) * output_spec.frame_size() as usize
    }
}

/// A bidirectional, format-converting, sample-rate-converting PCM queue.
pub struct AudioStream {
    inner: ReentrantMutex<RefCell<State>>,
}

type Guard<'a> = parking_lot::ReentrantMutexGuard<'a, RefCell<State>>;

impl AudioStream {
    /// Create a stream with neither spec set yet; call [`Self::set_format`]
    /// before `Put`/`Get`. Matches `SDL_CreateAudioStream(NULL, NULL)`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_chunk_size(DEFAULT_CHUNK_SIZE)
    }

    /// Create a stream with a non-default chunk size for the internal queue.
    #[must_use]
    pub fn with_chunk_size(chunk_size: usize) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(State::new(chunk_size))),
        }
    }

    /// Create a stream with both specs set up front. Matches
    /// `SDL_CreateAudioStream(src, dst)`.
    ///
    /// # Errors
    ///
    /// Returns an error only if building the initial resampler state fails,
    /// which in practice cannot happen for validated [`AudioSpec`]s.
    pub fn with_format(input: AudioSpec, output: AudioSpec) -> Result<Self> {
        let stream = Self::new();
        stream.set_format(Some(input), Some(output))?;
        Ok(stream)
    }

    /// Set the input and/or output spec. Passing `None` for one leaves it
    /// unchanged. Changing the input spec while data is already queued ends
    /// the current track (matches `SDL_SetAudioStreamFormat`'s conditional
    /// flush).
    pub fn set_format(&self, input: Option<AudioSpec>, output: Option<AudioSpec>) -> Result<()> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        if let Some(input) = input {
            if state.input_spec != Some(input) && !state.queue.is_empty() {
                state.queue.flush();
            }
            state.input_spec = Some(input);
        }
        if let Some(output) = output {
            state.output_spec = Some(output);
        }
        state.sync_resampler();
        Ok(())
    }

    /// Current `(input, output)` specs, either of which may be unset.
    #[must_use]
    pub fn format(&self) -> (Option<AudioSpec>, Option<AudioSpec>) {
        let guard = self.inner.lock();
        let state = guard.borrow();
        (state.input_spec, state.output_spec)
    }

    /// Set the frequency ratio: values above 1.0 play the stream back
    /// slower (lower effective output rate), below 1.0 faster.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::InvalidFrequencyRatio`] outside
    /// `[MIN_FREQUENCY_RATIO, MAX_FREQUENCY_RATIO]`.
    pub fn set_frequency_ratio(&self, ratio: f64) -> Result<()> {
        if !(MIN_FREQUENCY_RATIO..=MAX_FREQUENCY_RATIO).contains(&ratio) {
            return Err(StreamError::InvalidFrequencyRatio(
                ratio,
                MIN_FREQUENCY_RATIO,
                MAX_FREQUENCY_RATIO,
            ));
        }
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.freq_ratio = ratio;
        state.sync_resampler();
        Ok(())
    }

    #[must_use]
    pub fn frequency_ratio(&self) -> f64 {
        let guard = self.inner.lock();
        guard.borrow().freq_ratio
    }

    /// Append `data`, which must hold a whole number of input-spec frames.
    /// Large puts (`>= LARGE_PUT_THRESHOLD`) build their chunk run before
    /// taking the lock; small puts append incrementally under it.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SpecUnset`] if the input spec hasn't been set,
    /// or [`StreamError::UnalignedBuffer`] if `data.len()` isn't a multiple
    /// of the input frame size.
    pub fn put(&self, data: &[u8]) -> Result<()> {
        let input_spec = {
            let guard = self.inner.lock();
            guard.borrow().input_spec
        }
        .ok_or(StreamError::SpecUnset("input"))?;

        let frame_size = input_spec.frame_size() as usize;
        if frame_size == 0 || data.len() % frame_size != 0 {
            return Err(StreamError::UnalignedBuffer {
                len: data.len(),
                frame_size: input_spec.frame_size(),
            });
        }
        if data.is_empty() {
            return Ok(());
        }
        trace!(bytes = data.len(), "put");

        // Large puts build their chunk run before the lock is taken, so the
        // lock only has to splice an already-finished run in.
        let built = (data.len() >= LARGE_PUT_THRESHOLD)
            .then(|| build_chunks(data, DEFAULT_CHUNK_SIZE));

        let guard = self.inner.lock();
        let before = guard.borrow().available_bytes();
        {
            let mut state = guard.borrow_mut();
            match built {
                Some(chunks) => state.queue.write_chunks(input_spec, chunks),
                None => state.queue.write_small(input_spec, data),
            }
        }
        let after = guard.borrow().available_bytes();
        self.invoke_put_callback(&guard, after.saturating_sub(before));
        Ok(())
    }

    /// Pull converted/resampled bytes into `out`, which must have room for a
    /// whole number of output-spec frames. Returns the number of bytes
    /// actually written, which may be less than `out.len()` if the queue
    /// runs dry (even after invoking the get-callback).
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::SpecUnset`] if the output spec hasn't been
    /// set, or [`StreamError::UnalignedBuffer`] if `out.len()` isn't a
    /// multiple of the output frame size.
    pub fn get(&self, out: &mut [u8]) -> Result<usize> {
        let guard = self.inner.lock();
        let output_spec = guard
            .borrow()
            .output_spec
            .ok_or(StreamError::SpecUnset("output"))?;

        let frame_size = output_spec.frame_size() as usize;
        if frame_size == 0 || out.len() % frame_size != 0 {
            return Err(StreamError::UnalignedBuffer {
                len: out.len(),
                frame_size: output_spec.frame_size(),
            });
        }

        self.invoke_get_callback(&guard, output_spec, out.len());

        let mut total = 0;
        while total < out.len() {
            let produced = self.pull_one(&guard, output_spec, &mut out[total..]);
            if produced == 0 {
                break;
            }
            total += produced;
        }
        trace!(requested = out.len(), produced = total, "get");
        Ok(total)
    }

    /// Pull and convert one track's worth of data into `out`, stopping at a
    /// track boundary. Returns the number of bytes written. Ported from the
    /// per-iteration body of `GetAudioStreamDataInternal`.
    fn pull_one(
        &self,
        guard: &Guard<'_>,
        output_spec: AudioSpec,
        out: &mut [u8],
    ) -> usize {
        let mut state = guard.borrow_mut();

        let Some(input_spec) = state.queue.front_track_spec() else {
            return 0;
        };

        let output_frame_size = output_spec.frame_size() as usize;
        let max_output_frames = out.len() / output_frame_size;
        if max_output_frames == 0 {
            return 0;
        }

        // Fast path: formats, channels and rates all match -- straight copy.
        if input_spec == output_spec {
            let n = state.queue.read(out);
            return n;
        }

        // Re-sync against *this* track's own spec, not whatever `SetFormat`
        // last set: an older, not-yet-drained track must keep resampling at
        // the rate it was queued under.
        state.ensure_resampler(input_spec);

        let input_frame_size = input_spec.frame_size() as usize;
        let available_input_frames = state.queue.front_track_available() / input_frame_size;
        if available_input_frames == 0 {
            return 0;
        }

        let input_frames_needed = match &state.resampler {
            Some(r) => r.needed_input(max_output_frames).max(1),
            None => max_output_frames,
        };
        let input_frames_to_pull = input_frames_needed.min(available_input_frames);
        if input_frames_to_pull == 0 {
            return 0;
        }

        // Stage 1: pull raw input bytes and convert format + channel count
        // into native-order f32 at the *output* channel count, still at the
        // input sample rate.
        let mut raw = vec![0u8; input_frames_to_pull * input_frame_size];
        let read = state.queue.read(&mut raw);
        raw.truncate(read);
        let frames_read = read / input_frame_size;
        if frames_read == 0 {
            return 0;
        }

        let remapped_spec = AudioSpec {
            format: AudioFormatTag::F32,
            channels: output_spec.channels,
            freq: input_spec.freq,
        };
        let mut remapped = vec![0u8; remapped_spec.frames_to_bytes(frames_read)];
        if let Err(err) = convert_audio(&input_spec, &remapped_spec, &raw, &mut remapped) {
            warn!(?err, "conversion failed, dropping pulled frames");
            return 0;
        }

        let (output_bytes, produced_frames) = if let Some(resampler) = state.resampler.as_mut() {
            let float_in = f32_samples_from_bytes(&remapped);
            let max_resampled_frames = resampler.available_output(frames_read).min(max_output_frames);
            state.float_buffer.clear();
            state
                .float_buffer
                .resize(max_resampled_frames * output_spec.channels as usize, 0.0);
            let (_, produced) = resampler.process(&float_in, &mut state.float_buffer);

            let resampled_spec = AudioSpec {
                format: AudioFormatTag::F32,
                channels: output_spec.channels,
                freq: output_spec.freq,
            };
            let float_bytes = f32_samples_to_bytes(&state.float_buffer[..produced * output_spec.channels as usize]);
            let mut converted = vec![0u8; output_spec.frames_to_bytes(produced)];
            if let Err(err) = convert_audio(&resampled_spec, &output_spec, &float_bytes, &mut converted) {
                warn!(?err, "resampled conversion failed");
                return 0;
            }
            (converted, produced)
        } else {
            let converted_spec = AudioSpec {
                format: AudioFormatTag::F32,
                channels: output_spec.channels,
                freq: output_spec.freq,
            };
            let mut converted = vec![0u8; output_spec.frames_to_bytes(frames_read)];
            if let Err(err) = convert_audio(&converted_spec, &output_spec, &remapped, &mut converted) {
                warn!(?err, "format conversion failed");
                return 0;
            }
            (converted, frames_read)
        };

        let n = output_bytes.len().min(out.len());
        out[..n].copy_from_slice(&output_bytes[..n]);

        if state.queue.pop_front_if_empty() {
            debug!("track flushed and drained, resetting resampler history");
            if let Some(resampler) = state.resampler.as_mut() {
                resampler.reset();
            }
        }

        let _ = produced_frames;
        n
    }

    /// Bytes currently queued, across every track, before conversion.
    #[must_use]
    pub fn queued(&self) -> usize {
        let guard = self.inner.lock();
        guard.borrow().queue.queued_bytes()
    }

    /// Best-effort estimate of output bytes available from [`Self::get`]
    /// without blocking on more [`Self::put`] calls. Exact when no
    /// resampling is in effect; an estimate otherwise, since the resampler's
    /// phase depends on exactly which frames are pulled.
    #[must_use]
    pub fn available(&self) -> usize {
        let guard = self.inner.lock();
        guard.borrow().available_bytes()
    }

    /// End the current track so the next `Put` starts a fresh one even with
    /// an identical input spec.
    pub fn flush(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().queue.flush();
    }

    /// Discard all queued data and reset resampler phase/history.
    pub fn clear(&self) {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.queue.clear();
        if let Some(resampler) = state.resampler.as_mut() {
            resampler.reset();
        }
    }

    /// Acquire the stream's recursive lock explicitly, for callers that need
    /// to serialize a batch of operations against a concurrently-running
    /// get/put callback on another thread.
    pub fn lock(&self) -> StreamGuard<'_> {
        StreamGuard {
            _guard: self.inner.lock(),
        }
    }

    /// Install the get-callback, replacing any previous one.
    pub fn set_get_callback(&self, callback: Option<GetCallback>) {
        let guard = self.inner.lock();
        guard.borrow_mut().get_callback = callback;
    }

    /// Install the put-callback, replacing any previous one.
    pub fn set_put_callback(&self, callback: Option<PutCallback>) {
        let guard = self.inner.lock();
        guard.borrow_mut().put_callback = callback;
    }

    /// Record the device this stream is bound to. Device opening itself is
    /// outside this crate's scope; this is bookkeeping for a higher-level
    /// mixer.
    pub fn bind(&self, device: DeviceId) {
        let guard = self.inner.lock();
        guard.borrow_mut().bound_device = Some(device);
    }

    pub fn unbind(&self) {
        let guard = self.inner.lock();
        guard.borrow_mut().bound_device = None;
    }

    #[must_use]
    pub fn bound_device(&self) -> Option<DeviceId> {
        let guard = self.inner.lock();
        guard.borrow().bound_device
    }

    /// Invoke the get-callback at most once per `Get`, before any pulling
    /// happens, with a conservative *source*-spec byte estimate of how much
    /// more `Put` data is needed to satisfy `requested_bytes`. Skipped
    /// entirely when the queue can already satisfy the request. Matches
    /// `SDL_GetAudioStreamData`'s single up-front `approx_request` estimate,
    /// converted through the resampler's input/output ratio rather than
    /// passed through as raw output-side bytes.
    fn invoke_get_callback(&self, guard: &Guard<'_>, output_spec: AudioSpec, requested_bytes: usize) {
        let output_frame_size = output_spec.frame_size() as usize;
        if output_frame_size == 0 {
            return;
        }
        let requested_frames = (requested_bytes / output_frame_size) as i64;

        let (approx_request_frames, input_spec, needed_src_frames) = {
            let state = guard.borrow();
            let Some(input_spec) = state.input_spec else {
                return;
            };
            let available_frames = state.available_output_frames(output_spec) as i64;
            let approx_request_frames = requested_frames - available_frames;
            if approx_request_frames <= 0 {
                (approx_request_frames, input_spec, 0)
            } else {
                let needed_src_frames = match &state.resampler {
                    Some(r) => r.needed_input(approx_request_frames as usize),
                    None => approx_request_frames as usize,
                };
                (approx_request_frames, input_spec, needed_src_frames)
            }
        };

        if approx_request_frames <= 0 {
            return;
        }

        let needed_src_bytes = needed_src_frames * input_spec.frame_size() as usize;

        let taken = guard.borrow_mut().get_callback.take();
        if let Some(mut callback) = taken {
            callback(self, needed_src_bytes);
            guard.borrow_mut().get_callback = Some(callback);
        }
    }

    /// Invoke the put-callback if one is set, following the same
    /// take-call-restore discipline as [`Self::invoke_get_callback`].
    fn invoke_put_callback(
        &self,
        guard: &Guard<'_>,
        bytes_added: usize,
    ) {
        if bytes_added == 0 {
            return;
        }
        let taken = guard.borrow_mut().put_callback.take();
        if let Some(mut callback) = taken {
            callback(self, bytes_added);
            guard.borrow_mut().put_callback = Some(callback);
        }
    }
}

impl Default for AudioStream {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard from [`AudioStream::lock`]. Holds the stream's recursive lock
/// for as long as it's alive.
pub struct StreamGuard<'a> {
    _guard: Guard<'a>,
}

/// Decode a native-order `f32`-format byte buffer into owned samples.
/// `bytes`'s length is always a multiple of 4 by construction
/// (`AudioSpec::frames_to_bytes` on an `F32` spec). A safe cast (rather than
/// a zero-copy reinterpret) keeps this crate free of `unsafe`.
fn f32_samples_from_bytes(bytes: &[u8]) -> Vec<f32> {
    debug_assert_eq!(bytes.len() % 4, 0);
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes(c.try_into().expect("chunk is 4 bytes")))
        .collect()
}

/// Encode samples into native-order `f32`-format bytes.
fn f32_samples_to_bytes(samples: &[f32]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_ne_bytes()).collect()
}

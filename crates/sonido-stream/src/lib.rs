//! Sonido Stream - the audio stream engine's runtime half.
//!
//! Builds on [`sonido_core`]'s format/converter/resampler primitives to
//! provide [`AudioStream`]: a bidirectional, track-segmented queue that
//! converts and resamples data as it flows from `Put` to `Get`, with a
//! recursive-lock discipline that lets get/put callbacks re-enter the
//! stream safely.
//!
//! ```
//! use sonido_core::{AudioFormatTag, AudioSpec};
//! use sonido_stream::AudioStream;
//!
//! let input = AudioSpec::new(AudioFormatTag::S16LE, 1, 22_050).unwrap();
//! let output = AudioSpec::new(AudioFormatTag::F32LE, 2, 44_100).unwrap();
//! let stream = AudioStream::with_format(input, output).unwrap();
//!
//! stream.put(&[0u8; 64]).unwrap();
//! let mut out = vec![0u8; 512];
//! let produced = stream.get(&mut out).unwrap();
//! assert!(produced <= out.len());
//! ```

mod chunk;
mod config;
mod error;
mod queue;
mod stream;
mod track;

pub use config::{DEFAULT_CHUNK_SIZE, LARGE_PUT_THRESHOLD, MAX_FREE_CHUNKS};
pub use error::{Result, StreamError};
pub use stream::{AudioStream, DeviceId, GetCallback, PutCallback, StreamGuard};

use sonido_core::AudioSpec;

/// One-shot conversion: push all of `data` through a transient stream and
/// return everything it produces. A thin composition over `Create`/`Put`/
/// `Flush`/`Get` rather than a new primitive — see `SDL_ConvertAudioSamples`
/// in the original implementation, which this mirrors.
///
/// # Errors
///
/// Returns a [`StreamError`] if `src`/`dst` fail validation or `data.len()`
/// isn't a multiple of `src`'s frame size.
pub fn convert_samples(src: AudioSpec, dst: AudioSpec, data: &[u8]) -> Result<Vec<u8>> {
    let stream = AudioStream::with_format(src, dst)?;
    stream.put(data)?;
    stream.flush();

    let mut out = Vec::new();
    let mut scratch = vec![0u8; DEFAULT_CHUNK_SIZE];
    loop {
        let n = stream.get(&mut scratch)?;
        if n == 0 {
            break;
        }
        out.extend_from_slice(&scratch[..n]);
    }
    Ok(out)
}

//! Property tests for the queue's byte-preservation invariants under
//! randomized `Put`/`Get` interleavings with matching input and output specs.

use proptest::prelude::*;
use sonido_core::{AudioFormatTag, AudioSpec};
use sonido_stream::AudioStream;

fn spec() -> AudioSpec {
    AudioSpec::new(AudioFormatTag::S16LE, 1, 44_100).unwrap()
}

proptest! {
    /// Everything `Get` ever returns, concatenated, is a prefix of everything
    /// `Put` ever received, concatenated -- when `src == dst` no conversion
    /// can alter a single byte.
    #[test]
    fn get_output_is_prefix_of_put_input(
        puts in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64usize).prop_map(|mut v| {
            v.truncate(v.len() - v.len() % 2);
            v
        }), 0..16),
        get_chunk in 2usize..128,
    ) {
        let s = spec();
        let stream = AudioStream::with_format(s, s).unwrap();
        let mut sent = Vec::new();

        for chunk in &puts {
            stream.put(chunk).unwrap();
            sent.extend_from_slice(chunk);
        }
        stream.flush();

        let mut received = Vec::new();
        let get_chunk = get_chunk - get_chunk % 2 + 2;
        let mut buf = vec![0u8; get_chunk];
        loop {
            let n = stream.get(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
        }

        prop_assert_eq!(&received[..], &sent[..received.len()]);
        prop_assert!(received.len() <= sent.len());
    }

    /// `queued()` always equals the sum of every byte length ever put minus
    /// every byte length ever successfully gotten.
    #[test]
    fn queued_matches_outstanding_byte_count(
        puts in prop::collection::vec(1usize..32, 1..8),
        get_size in 2usize..64,
    ) {
        let s = spec();
        let stream = AudioStream::with_format(s, s).unwrap();
        let mut put_total = 0usize;

        for len in &puts {
            let len = len - len % 2;
            if len == 0 {
                continue;
            }
            let data = vec![0u8; len];
            stream.put(&data).unwrap();
            put_total += len;
        }

        let get_size = get_size - get_size % 2 + 2;
        let mut buf = vec![0u8; get_size];
        let n = stream.get(&mut buf).unwrap();

        prop_assert_eq!(stream.queued(), put_total - n);
    }
}

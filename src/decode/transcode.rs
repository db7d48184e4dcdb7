//! Incremental decoding helper shared by the blocking and async decoders.

use encoding_rs::{CoderResult, Decoder};

/// Decodes `src` and appends the UTF-8 output to `out`.
///
/// Malformed input becomes U+FFFD. Bytes of an incomplete trailing sequence
/// stay inside the decoder until the next call; pass `last = true` once, at
/// the end of the stream, to flush them.
pub(crate) fn decode_append(decoder: &mut Decoder, src: &[u8], last: bool, out: &mut String) {
    let mut remaining = src;
    loop {
        let needed = decoder
            .max_utf8_buffer_length(remaining.len())
            .unwrap_or_else(|| remaining.len().saturating_mul(3));
        out.reserve(needed.max(4));

        let (result, read, _had_errors) = decoder.decode_to_string(remaining, out, last);
        remaining = &remaining[read..];
        match result {
            CoderResult::InputEmpty => return,
            CoderResult::OutputFull => {}
        }
    }
}

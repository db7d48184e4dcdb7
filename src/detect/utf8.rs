//! UTF-8 validity heuristic.

use super::constants::MAX_TRAILING_PARTIAL;
use super::registry::EncodingHandle;
use super::result::{Detection, DetectionSource};

/// Reports UTF-8 when `content` holds non-ASCII bytes and is well-formed.
///
/// The window may cut a multi-byte sequence in half, so a trailing partial
/// sequence is ignored.
#[must_use]
pub fn sniff_utf8(content: &[u8]) -> Option<Detection> {
    let content = trim_partial_sequence(content);
    let has_high_bit = content.iter().any(|&b| b >= 0x80);
    (has_high_bit && std::str::from_utf8(content).is_ok())
        .then(|| Detection::new(EncodingHandle::utf8(), false, DetectionSource::Utf8Heuristic))
}

/// Cuts the buffer before the start byte of a trailing multi-byte sequence.
///
/// At most [`MAX_TRAILING_PARTIAL`] bytes are inspected; an ASCII byte ends
/// the search without trimming.
fn trim_partial_sequence(content: &[u8]) -> &[u8] {
    for (index, &byte) in content.iter().enumerate().rev().take(MAX_TRAILING_PARTIAL) {
        if byte < 0x80 {
            break;
        }
        if is_sequence_start(byte) {
            return &content[..index];
        }
    }
    content
}

fn is_sequence_start(byte: u8) -> bool {
    byte & 0xC0 != 0x80
}

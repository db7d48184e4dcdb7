//! Lookup of encodings by label.
//!
//! Labels are resolved against the WHATWG Encoding Standard table provided by
//! `encoding_rs`. Canonical names are the lowercase WHATWG names, e.g.
//! `"shift_jis"` or `"utf-16be"`.

use std::fmt;

use encoding_rs::{Decoder, Encoding, REPLACEMENT, UTF_8, WINDOWS_1252};

use super::error::CharsetError;

/// An encoding resolved from the registry.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct EncodingHandle {
    encoding: &'static Encoding,
}

impl EncodingHandle {
    /// Wraps an `encoding_rs` encoding.
    #[must_use]
    pub fn new(encoding: &'static Encoding) -> Self {
        Self { encoding }
    }

    /// The UTF-8 encoding.
    #[must_use]
    pub fn utf8() -> Self {
        Self::new(UTF_8)
    }

    /// The hard default used when detection has nothing better.
    ///
    /// Every byte value is representable in windows-1252, so decoding with it
    /// never fails.
    #[must_use]
    pub fn fallback() -> Self {
        Self::new(WINDOWS_1252)
    }

    /// Returns the underlying `encoding_rs` encoding.
    #[must_use]
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the lowercase WHATWG name.
    #[must_use]
    pub fn canonical_name(&self) -> String {
        self.encoding.name().to_ascii_lowercase()
    }

    /// True when bytes in this encoding are already UTF-8 and need no transform.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.encoding == UTF_8
    }

    /// Creates an incremental decoder producing UTF-8.
    ///
    /// A leading BOM of this encoding is removed; any other BOM is decoded as
    /// ordinary text.
    ///
    /// # Errors
    ///
    /// Returns [`CharsetError::UnsupportedDecoder`] for the `replacement`
    /// encoding, which maps every input to a single U+FFFD.
    pub fn new_decoder(&self) -> Result<Decoder, CharsetError> {
        if self.encoding == REPLACEMENT {
            return Err(CharsetError::unsupported_decoder(self.canonical_name()));
        }
        Ok(self.encoding.new_decoder_with_bom_removal())
    }
}

impl fmt::Debug for EncodingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EncodingHandle")
            .field(&self.encoding.name())
            .finish()
    }
}

impl fmt::Display for EncodingHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

/// Resolves an encoding label.
///
/// Matching is case-insensitive and ignores surrounding ASCII whitespace.
/// Labels of the `replacement` encoding, such as `iso-2022-kr`, resolve to
/// nothing so detection moves on to the next stage.
#[must_use]
pub fn lookup(label: &str) -> Option<EncodingHandle> {
    Encoding::for_label(label.as_bytes())
        .filter(|encoding| *encoding != REPLACEMENT)
        .map(EncodingHandle::new)
}

/// Resolves an encoding label, reporting unknown labels as an error.
pub(crate) fn resolve(label: &str) -> Result<EncodingHandle, CharsetError> {
    lookup(label).ok_or_else(|| CharsetError::unresolvable(label))
}

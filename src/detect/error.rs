//! Error types for encoding detection and stream decoding.
//!
//! Most variants describe why a single detection stage declined to answer.
//! Those are swallowed by the cascade and only logged. The remaining variants
//! are fatal and reach the caller of the stream decoders.

use std::io;

use thiserror::Error;

/// Errors produced while determining an encoding or wrapping a stream.
#[derive(Debug, Error)]
pub enum CharsetError {
    /// The declared Content-Type could not be parsed as a media type.
    #[error("malformed Content-Type {value:?}: {reason}")]
    MalformedContentType {
        /// The raw header value.
        value: String,
        /// Parser diagnostic.
        reason: String,
    },

    /// A charset name was found but the registry does not know it.
    #[error("unresolvable charset name {name:?}")]
    UnresolvableCharset {
        /// The label as it appeared in the input.
        name: String,
    },

    /// The statistical classifier had no usable candidate.
    #[error("charset not detected")]
    NotDetected,

    /// Reading the lookahead prefix from the underlying stream failed.
    #[error("error reading stream prefix: {source}")]
    StreamRead {
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// The resolved encoding has no usable decode transform.
    #[error("no decoder available for encoding {name}")]
    UnsupportedDecoder {
        /// Canonical name of the resolved encoding.
        name: String,
    },
}

impl CharsetError {
    /// Creates a malformed Content-Type error.
    pub fn malformed_content_type(value: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedContentType {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Creates an unresolvable charset error.
    pub fn unresolvable(name: impl Into<String>) -> Self {
        Self::UnresolvableCharset { name: name.into() }
    }

    /// Creates a stream read error.
    pub fn stream_read(source: io::Error) -> Self {
        Self::StreamRead { source }
    }

    /// Creates an unsupported decoder error.
    pub fn unsupported_decoder(name: impl Into<String>) -> Self {
        Self::UnsupportedDecoder { name: name.into() }
    }

    /// Returns true when the error must abort stream construction.
    ///
    /// Non-fatal errors only mean that one detection stage had nothing to say.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StreamRead { .. } | Self::UnsupportedDecoder { .. })
    }
}

impl From<CharsetError> for io::Error {
    fn from(error: CharsetError) -> Self {
        match error {
            CharsetError::StreamRead { source } => source,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

//! Charsniff Core Library
//!
//! This library decides which character encoding a byte stream is written in
//! and wraps the stream so that it yields UTF-8, without buffering more than
//! a small prefix of the input.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`detect`] - Encoding detection cascade (BOM, Content-Type, meta prescan,
//!   statistical probe, UTF-8 heuristic, default)
//! - [`decode`] - Lazy UTF-8 decoding of blocking readers and async chunk streams
//! - [`http`] - HTTP client whose response bodies come back decoded

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod decode;
pub mod detect;
pub mod http;
mod user_agent;

// Re-export commonly used types
pub use decode::{DecodedBody, DecodedReader, decode_body, wrap_stream};
pub use detect::{
    CharsetError, ChardetngClassifier, Classifier, Detection, DetectionSource, EncodingHandle,
    EncodingResolver, LOOKAHEAD_LEN, ResultFilter, StatisticalProbe, charset_from_content,
    determine_encoding, lookup,
};
pub use http::{CharsetClient, DecodedResponse, FetchError};

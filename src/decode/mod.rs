//! Lazy UTF-8 decoding of byte streams.
//!
//! The encoding of a stream is decided from a bounded prefix; the prefix is
//! then replayed in front of the unread remainder and the whole stream is
//! transcoded as the caller pulls from it. Nothing beyond the prefix and one
//! read buffer is held in memory.
//!
//! - [`wrap_stream`] wraps a blocking [`std::io::Read`].
//! - [`decode_body`] wraps an async stream of byte chunks.

mod body;
mod lookahead;
mod reader;
mod transcode;

pub use body::{DecodedBody, decode_body};
pub use lookahead::{Lookahead, Reassembled};
pub use reader::{DecodedReader, wrap_stream};

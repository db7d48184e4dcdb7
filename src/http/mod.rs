//! HTTP fetching with charset-aware body decoding.
//!
//! [`CharsetClient`] issues a GET request, hands the response's
//! `Content-Type` and body to [`crate::decode::decode_body`], and returns a
//! [`DecodedResponse`] whose body yields UTF-8.

mod client;
mod constants;
mod error;

pub use client::{CharsetClient, DecodedResponse};
pub use constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
pub use error::FetchError;

//! HTTP client whose responses come back decoded to UTF-8.
//!
//! This module provides the `CharsetClient` struct which fetches a URL and
//! wraps the response body in the streaming decoder, using the response's
//! `Content-Type` as the declared charset.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{StreamExt, TryStreamExt};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, instrument};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use super::error::FetchError;
use crate::decode::{DecodedBody, decode_body};
use crate::detect::{Detection, EncodingResolver};
use crate::user_agent;

/// HTTP client that decodes response bodies to UTF-8.
///
/// This client is designed to be created once and reused for many requests,
/// taking advantage of connection pooling. The resolver is shared by every
/// response.
///
/// # Example
///
/// ```no_run
/// use charsniff_core::http::CharsetClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = CharsetClient::new();
/// let response = client.fetch("https://example.com/legacy.html").await?;
/// println!("decoded as {}", response.detection().name);
/// let text = response.text().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CharsetClient {
    client: Client,
    resolver: Arc<EncodingResolver>,
}

impl Default for CharsetClient {
    fn default() -> Self {
        Self::new()
    }
}

impl CharsetClient {
    /// Creates a new client with default timeouts and no statistical stage.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = base_client_builder(connect_timeout_secs, read_timeout_secs)
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self {
            client,
            resolver: Arc::new(EncodingResolver::new()),
        }
    }

    /// Replaces the resolver used to decide body encodings.
    #[must_use]
    pub fn with_resolver(mut self, resolver: EncodingResolver) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    /// Returns the resolver used to decide body encodings.
    #[must_use]
    pub fn resolver(&self) -> &EncodingResolver {
        &self.resolver
    }

    /// Fetches `url` with GET and wraps the body in a UTF-8 decoder.
    ///
    /// The encoding is decided before this returns, from the first bytes of
    /// the body; the remainder is decoded as the caller consumes it.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` if:
    /// - The URL is invalid or not HTTP(S)
    /// - The request fails (network error, timeout)
    /// - The server returns a non-success status
    /// - Reading the start of the body fails
    /// - The resolved encoding has no decoder
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<DecodedResponse, FetchError> {
        debug!("starting fetch");

        let parsed_url = Url::parse(url).map_err(|_| FetchError::invalid_url(url))?;
        if !matches!(parsed_url.scheme(), "http" | "https") {
            return Err(FetchError::invalid_url(url));
        }

        let response = self
            .client
            .get(parsed_url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::http_status(url, status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        debug!(content_type = %content_type, "received response headers");

        let chunk_url = url.to_string();
        let chunks = response
            .bytes_stream()
            .map_err(move |e| FetchError::network(chunk_url.clone(), e));
        let body = decode_body(chunks, &content_type, &self.resolver).await?;

        let detection = body.detection();
        info!(
            encoding = %detection.name,
            certain = detection.certain,
            source = detection.source.as_str(),
            "decoding response body"
        );

        Ok(DecodedResponse {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// A successful response with a lazily decoded body.
#[derive(Debug)]
pub struct DecodedResponse {
    url: String,
    status: u16,
    content_type: String,
    body: DecodedBody<FetchError>,
}

impl DecodedResponse {
    /// The requested URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The HTTP status code.
    #[must_use]
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The declared `Content-Type`, empty when absent.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The encoding decision for the body.
    #[must_use]
    pub fn detection(&self) -> &Detection {
        self.body.detection()
    }

    /// Returns the decoded body stream.
    #[must_use]
    pub fn into_body(self) -> DecodedBody<FetchError> {
        self.body
    }

    /// Drains the body into a string.
    ///
    /// Passed-through bodies that are not valid UTF-8 are converted lossily.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while reading the body.
    pub async fn text(self) -> Result<String, FetchError> {
        let mut bytes = Vec::new();
        let mut body = self.body;
        while let Some(chunk) = body.next().await {
            let chunk: Bytes = chunk?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }
}

fn base_client_builder(connect_timeout_secs: u64, read_timeout_secs: u64) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .timeout(Duration::from_secs(read_timeout_secs))
        .gzip(true)
        .user_agent(user_agent::default_user_agent())
}

//! Decoding of async chunk streams such as HTTP response bodies.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use encoding_rs::Decoder;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use tracing::{debug, instrument};

use super::transcode::decode_append;
use crate::detect::{CharsetError, Detection, EncodingResolver, LOOKAHEAD_LEN};

/// A body stream yielding UTF-8 chunks, created by [`decode_body`].
pub struct DecodedBody<E> {
    detection: Detection,
    stream: BoxStream<'static, Result<Bytes, E>>,
}

impl<E> DecodedBody<E> {
    /// The encoding decision made for this body.
    #[must_use]
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// Returns the decoded chunk stream.
    #[must_use]
    pub fn into_stream(self) -> BoxStream<'static, Result<Bytes, E>> {
        self.stream
    }
}

impl<E> Stream for DecodedBody<E> {
    type Item = Result<Bytes, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().stream.poll_next_unpin(cx)
    }
}

impl<E> fmt::Debug for DecodedBody<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedBody")
            .field("detection", &self.detection)
            .finish_non_exhaustive()
    }
}

/// Wraps a chunk stream so that it yields the UTF-8 transcoding of its bytes.
///
/// Chunks are pulled until at least [`LOOKAHEAD_LEN`] bytes are buffered or
/// the stream ends. The encoding is decided from the first
/// [`LOOKAHEAD_LEN`] of those bytes, then every buffered chunk is replayed
/// ahead of the rest of the stream. An ended stream is not polled again.
///
/// # Errors
///
/// Returns the stream's own error if a chunk fails before detection, or the
/// converted [`CharsetError::UnsupportedDecoder`] if the resolved encoding
/// cannot be decoded.
#[instrument(level = "debug", skip(stream, resolver))]
pub async fn decode_body<S, E>(
    stream: S,
    content_type: &str,
    resolver: &EncodingResolver,
) -> Result<DecodedBody<E>, E>
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: From<CharsetError> + Send + 'static,
{
    let mut stream = stream.boxed();
    let mut prefix = Vec::new();
    let mut buffered = 0;
    let mut reached_end = false;

    while buffered < LOOKAHEAD_LEN {
        let Some(chunk) = stream.next().await else {
            reached_end = true;
            break;
        };
        let chunk = chunk?;
        buffered += chunk.len();
        prefix.push(chunk);
    }

    let detection = resolver.resolve(&lookahead_window(&prefix), content_type);
    debug!(
        prefix_len = buffered,
        reached_end,
        encoding = %detection.name,
        "wrapping body stream"
    );

    let head = stream::iter(prefix.into_iter().map(Ok));
    let source = if reached_end {
        head.boxed()
    } else {
        head.chain(stream).boxed()
    };

    let stream = if detection.encoding.is_identity() {
        source
    } else {
        decoding_stream(source, detection.encoding.new_decoder()?)
    };

    Ok(DecodedBody { detection, stream })
}

/// Copies the first [`LOOKAHEAD_LEN`] bytes of `chunks` into one buffer.
fn lookahead_window(chunks: &[Bytes]) -> Vec<u8> {
    let mut window = Vec::with_capacity(LOOKAHEAD_LEN);
    for chunk in chunks {
        let take = chunk.len().min(LOOKAHEAD_LEN - window.len());
        window.extend_from_slice(&chunk[..take]);
        if window.len() == LOOKAHEAD_LEN {
            break;
        }
    }
    window
}

fn decoding_stream<E: Send + 'static>(
    source: BoxStream<'static, Result<Bytes, E>>,
    decoder: Decoder,
) -> BoxStream<'static, Result<Bytes, E>> {
    stream::unfold(Some((source, decoder)), |state| async move {
        let (mut source, mut decoder) = state?;
        let mut output = String::new();
        match source.next().await {
            Some(Ok(chunk)) => {
                decode_append(&mut decoder, &chunk, false, &mut output);
                Some((Ok(Bytes::from(output)), Some((source, decoder))))
            }
            Some(Err(e)) => Some((Err(e), None)),
            None => {
                decode_append(&mut decoder, &[], true, &mut output);
                Some((Ok(Bytes::from(output)), None))
            }
        }
    })
    .filter(|item| std::future::ready(!matches!(item, Ok(chunk) if chunk.is_empty())))
    .boxed()
}

//! Blocking decode wrapper over [`std::io::Read`].

use std::fmt;
use std::io::{self, Read};

use encoding_rs::Decoder;
use tracing::{debug, instrument};

use super::lookahead::{Lookahead, Reassembled};
use super::transcode::decode_append;
use crate::detect::{CharsetError, Detection, EncodingResolver, LOOKAHEAD_LEN};

/// Size of the read buffer used while decoding.
const READ_CHUNK_LEN: usize = 8 * 1024;

/// Wraps `reader` so that it yields the UTF-8 transcoding of its bytes.
///
/// The encoding is decided once, from the first [`LOOKAHEAD_LEN`] bytes and
/// `content_type`. Those bytes are replayed ahead of the rest of the stream,
/// so nothing is lost or duplicated. UTF-8 input is passed through unchanged.
///
/// # Errors
///
/// Returns [`CharsetError::StreamRead`] if reading the prefix fails and
/// [`CharsetError::UnsupportedDecoder`] if the resolved encoding cannot be
/// decoded.
///
/// # Example
///
/// ```
/// use std::io::Read;
/// use charsniff_core::decode::wrap_stream;
/// use charsniff_core::detect::EncodingResolver;
///
/// let body: &[u8] = b"<meta charset=\"iso-8859-2\">\xB1";
/// let mut decoded = wrap_stream(body, "", &EncodingResolver::new())?;
/// let mut text = String::new();
/// decoded.read_to_string(&mut text)?;
/// assert!(text.ends_with('ą'));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[instrument(level = "debug", skip(reader, resolver))]
pub fn wrap_stream<R: Read>(
    mut reader: R,
    content_type: &str,
    resolver: &EncodingResolver,
) -> Result<DecodedReader<R>, CharsetError> {
    let lookahead = Lookahead::read_from(&mut reader)?;
    let detection = resolver.resolve(lookahead.as_bytes(), content_type);
    debug!(
        prefix_len = lookahead.as_bytes().len(),
        reached_end = lookahead.reached_end(),
        encoding = %detection.name,
        "wrapping stream"
    );

    let source = lookahead.reassemble(reader);
    let inner = if detection.encoding.is_identity() {
        Inner::Passthrough(source)
    } else {
        let decoder = detection.encoding.new_decoder()?;
        Inner::Decoding(Box::new(DecodingState::new(source, decoder)))
    };

    Ok(DecodedReader { detection, inner })
}

/// A reader producing UTF-8, created by [`wrap_stream`].
pub struct DecodedReader<R> {
    detection: Detection,
    inner: Inner<R>,
}

enum Inner<R> {
    Passthrough(Reassembled<R>),
    Decoding(Box<DecodingState<R>>),
}

impl<R> DecodedReader<R> {
    /// The encoding decision made for this stream.
    #[must_use]
    pub fn detection(&self) -> &Detection {
        &self.detection
    }

    /// True when bytes are passed through without transcoding.
    #[must_use]
    pub fn is_passthrough(&self) -> bool {
        matches!(self.inner, Inner::Passthrough(_))
    }
}

impl<R: Read> Read for DecodedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.inner {
            Inner::Passthrough(source) => source.read(buf),
            Inner::Decoding(state) => state.read(buf),
        }
    }
}

impl<R> fmt::Debug for DecodedReader<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedReader")
            .field("detection", &self.detection)
            .field("passthrough", &self.is_passthrough())
            .finish_non_exhaustive()
    }
}

struct DecodingState<R> {
    source: Reassembled<R>,
    decoder: Decoder,
    input: Vec<u8>,
    output: String,
    consumed: usize,
    finished: bool,
}

impl<R: Read> DecodingState<R> {
    fn new(source: Reassembled<R>, decoder: Decoder) -> Self {
        Self {
            source,
            decoder,
            input: vec![0; READ_CHUNK_LEN],
            output: String::new(),
            consumed: 0,
            finished: false,
        }
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            let pending = &self.output.as_bytes()[self.consumed..];
            if !pending.is_empty() {
                let n = pending.len().min(buf.len());
                buf[..n].copy_from_slice(&pending[..n]);
                self.consumed += n;
                return Ok(n);
            }
            if self.finished {
                return Ok(0);
            }

            // A read that only fed a partial sequence into the decoder
            // produces no output, so keep pulling.
            let n = self.source.read(&mut self.input)?;
            self.output.clear();
            self.consumed = 0;
            self.finished = n == 0;
            decode_append(
                &mut self.decoder,
                &self.input[..n],
                self.finished,
                &mut self.output,
            );
        }
    }
}

//! Lookahead capture and prefix/remainder reassembly for blocking readers.

use std::io::{self, Cursor, Read};

use crate::detect::{CharsetError, LOOKAHEAD_LEN};

/// The leading bytes of a stream, captured once for detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookahead {
    bytes: Vec<u8>,
    reached_end: bool,
}

impl Lookahead {
    /// Reads up to [`LOOKAHEAD_LEN`] bytes from `reader`.
    ///
    /// Short reads are retried until the window is full or the reader
    /// reports end of stream. Interrupted reads are retried.
    ///
    /// # Errors
    ///
    /// Returns [`CharsetError::StreamRead`] for any other read error.
    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self, CharsetError> {
        let mut bytes = vec![0; LOOKAHEAD_LEN];
        let mut filled = 0;
        let mut reached_end = false;

        while filled < LOOKAHEAD_LEN {
            match reader.read(&mut bytes[filled..]) {
                Ok(0) => {
                    reached_end = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(CharsetError::stream_read(e)),
            }
        }

        bytes.truncate(filled);
        Ok(Self { bytes, reached_end })
    }

    /// The captured bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// True when the stream ended inside the window.
    #[must_use]
    pub fn reached_end(&self) -> bool {
        self.reached_end
    }

    /// Puts the captured bytes back in front of the unread remainder.
    ///
    /// When the stream already ended, `reader` is dropped and never read again.
    pub fn reassemble<R>(self, reader: R) -> Reassembled<R> {
        Reassembled {
            prefix: Cursor::new(self.bytes),
            rest: (!self.reached_end).then_some(reader),
        }
    }
}

/// A reader yielding a captured prefix followed by the rest of the stream.
#[derive(Debug)]
pub struct Reassembled<R> {
    prefix: Cursor<Vec<u8>>,
    rest: Option<R>,
}

impl<R: Read> Read for Reassembled<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.prefix.read(buf)?;
        if n > 0 || buf.is_empty() {
            return Ok(n);
        }
        match self.rest.as_mut() {
            Some(rest) => rest.read(buf),
            None => Ok(0),
        }
    }
}

//! Constants for the detection cascade.

/// Number of leading bytes captured from a stream for detection.
pub const LOOKAHEAD_LEN: usize = 1024;

/// Maximum number of trailing bytes inspected when trimming a truncated
/// multi-byte UTF-8 sequence.
pub(crate) const MAX_TRAILING_PARTIAL: usize = 3;

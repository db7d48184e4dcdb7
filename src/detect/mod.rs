//! Text encoding detection for byte streams.
//!
//! This module decides, from at most the first [`LOOKAHEAD_LEN`] bytes of a
//! stream and its declared Content-Type, which encoding the stream is in.
//!
//! # Features
//!
//! - Byte order mark sniffing
//! - Content-Type `charset` parameter parsing
//! - `<meta>` charset prescanning with `http-equiv` pragma gating
//! - Pluggable statistical classification with candidate filtering
//! - UTF-8 validity heuristic and a windows-1252 fallback
//!
//! Detection never fails. Stages that cannot answer (malformed header,
//! unknown charset label, inconclusive classifier) are skipped.
//!
//! # Example
//!
//! ```
//! use charsniff_core::detect::{EncodingResolver, StatisticalProbe};
//!
//! let resolver = EncodingResolver::with_probe(StatisticalProbe::chardetng());
//! let detection = resolver.resolve(b"\xEF\xBB\xBFhello", "text/plain");
//! assert_eq!(detection.name, "utf-8");
//! assert!(detection.certain);
//! ```

mod bom;
mod constants;
mod content_type;
mod error;
mod prescan;
pub mod registry;
mod resolver;
mod result;
mod statistical;
mod utf8;

pub use bom::sniff_bom;
pub use constants::LOOKAHEAD_LEN;
pub use content_type::{content_type_charset, declared_charset};
pub use error::CharsetError;
pub use prescan::{charset_from_content, prescan};
pub use registry::{EncodingHandle, lookup};
pub use resolver::{EncodingResolver, determine_encoding};
pub use result::{Detection, DetectionSource};
pub use statistical::{
    Candidate, ChardetngClassifier, Classifier, Preference, ResultFilter, StatisticalProbe,
    normalize_tld,
};
pub use utf8::sniff_utf8;

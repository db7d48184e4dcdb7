//! The detection cascade.
//!
//! Stages run in a fixed priority order and the first one with an answer
//! wins:
//!
//! 1. byte order mark (certain)
//! 2. Content-Type `charset` parameter (certain)
//! 3. `<meta>` prescan
//! 4. statistical probe, when one is configured
//! 5. UTF-8 validity heuristic
//! 6. windows-1252 fallback
//!
//! The cascade is total: some encoding is always returned.

use tracing::{debug, instrument};

use super::bom::sniff_bom;
use super::constants::LOOKAHEAD_LEN;
use super::content_type::content_type_charset;
use super::prescan::prescan;
use super::registry::EncodingHandle;
use super::result::{Detection, DetectionSource};
use super::statistical::StatisticalProbe;
use super::utf8::sniff_utf8;

/// Stages tried before the fallback, highest priority first.
const CASCADE: [DetectionSource; 5] = [
    DetectionSource::Bom,
    DetectionSource::ContentType,
    DetectionSource::MetaPrescan,
    DetectionSource::Statistical,
    DetectionSource::Utf8Heuristic,
];

/// Inputs shared by every stage of one detection.
struct StageInput<'a> {
    content: &'a [u8],
    content_type: &'a str,
    probe: Option<&'a StatisticalProbe>,
}

impl DetectionSource {
    fn run(self, input: &StageInput<'_>) -> Option<Detection> {
        match self {
            Self::Bom => sniff_bom(input.content),
            Self::ContentType => match content_type_charset(input.content_type) {
                Ok(encoding) => encoding
                    .map(|encoding| Detection::new(encoding, true, DetectionSource::ContentType)),
                Err(e) => {
                    debug!(error = %e, "ignoring declared content type");
                    None
                }
            },
            Self::MetaPrescan => (!input.content.is_empty())
                .then(|| prescan(input.content))
                .flatten(),
            Self::Statistical => input.probe.and_then(|probe| probe.detect(input.content)),
            Self::Utf8Heuristic => sniff_utf8(input.content),
            Self::Default => Some(Detection::new(
                EncodingHandle::fallback(),
                false,
                DetectionSource::Default,
            )),
        }
    }
}

/// Determines the encoding of `content`.
///
/// Only the first [`LOOKAHEAD_LEN`] bytes are considered. `content_type` is
/// the declared media type and may be empty. `probe` is the optional
/// statistical stage.
///
/// # Examples
///
/// ```
/// use charsniff_core::detect::{DetectionSource, determine_encoding};
///
/// let detection = determine_encoding(b"<meta charset=\"euc-jp\">", "", None);
/// assert_eq!(detection.name, "euc-jp");
/// assert!(!detection.certain);
/// assert_eq!(detection.source, DetectionSource::MetaPrescan);
/// ```
#[must_use]
#[instrument(level = "debug", skip_all, fields(len = content.len(), content_type = %content_type))]
pub fn determine_encoding(
    content: &[u8],
    content_type: &str,
    probe: Option<&StatisticalProbe>,
) -> Detection {
    let input = StageInput {
        content: &content[..content.len().min(LOOKAHEAD_LEN)],
        content_type,
        probe,
    };

    let detection = CASCADE
        .iter()
        .find_map(|stage| stage.run(&input))
        .unwrap_or_else(|| {
            Detection::new(EncodingHandle::fallback(), false, DetectionSource::Default)
        });

    debug!(
        encoding = %detection.name,
        certain = detection.certain,
        source = detection.source.as_str(),
        "determined encoding"
    );
    detection
}

/// Reusable detection configuration.
///
/// A resolver is immutable once built and can be shared across threads and
/// streams.
#[derive(Debug, Clone, Default)]
pub struct EncodingResolver {
    probe: Option<StatisticalProbe>,
}

impl EncodingResolver {
    /// A resolver without a statistical stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that consults `probe` after the markup stages.
    #[must_use]
    pub fn with_probe(probe: StatisticalProbe) -> Self {
        Self { probe: Some(probe) }
    }

    /// Returns the statistical probe, if any.
    #[must_use]
    pub fn probe(&self) -> Option<&StatisticalProbe> {
        self.probe.as_ref()
    }

    /// Determines the encoding of `content`; see [`determine_encoding`].
    #[must_use]
    pub fn resolve(&self, content: &[u8], content_type: &str) -> Detection {
        determine_encoding(content, content_type, self.probe.as_ref())
    }
}

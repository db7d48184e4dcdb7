//! The shared result shape of every detection stage.

use serde::Serialize;

use super::registry::EncodingHandle;

/// Which cascade stage produced a [`Detection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSource {
    /// Byte order mark at the start of the data.
    Bom,
    /// `charset` parameter of the declared Content-Type.
    ContentType,
    /// `<meta>` declaration found in the leading markup.
    MetaPrescan,
    /// Statistical classifier.
    Statistical,
    /// The data is well-formed UTF-8 with non-ASCII content.
    Utf8Heuristic,
    /// Nothing else applied.
    Default,
}

impl DetectionSource {
    /// Stable lowercase label for display output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bom => "bom",
            Self::ContentType => "content_type",
            Self::MetaPrescan => "meta_prescan",
            Self::Statistical => "statistical",
            Self::Utf8Heuristic => "utf8_heuristic",
            Self::Default => "default",
        }
    }
}

/// An encoding decision.
///
/// `certain` is true only for definitive signals (a BOM or a declared
/// Content-Type charset).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Detection {
    #[serde(skip)]
    pub encoding: EncodingHandle,
    pub name: String,
    pub certain: bool,
    pub source: DetectionSource,
}

impl Detection {
    pub(crate) fn new(encoding: EncodingHandle, certain: bool, source: DetectionSource) -> Self {
        Self {
            name: encoding.canonical_name(),
            encoding,
            certain,
            source,
        }
    }

    /// A detection whose reported name differs from the handle's own name.
    pub(crate) fn renamed(
        encoding: EncodingHandle,
        name: impl Into<String>,
        certain: bool,
        source: DetectionSource,
    ) -> Self {
        Self {
            encoding,
            name: name.into(),
            certain,
            source,
        }
    }
}

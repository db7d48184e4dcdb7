//! Statistical charset classification with result filtering.
//!
//! The classifier itself sits behind the [`Classifier`] trait so callers can
//! substitute their own. [`ChardetngClassifier`] is the default, backed by the
//! `chardetng` crate.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use charsniff_core::detect::{ChardetngClassifier, ResultFilter, StatisticalProbe};
//!
//! let filter = ResultFilter::new().with_languages(["ja", ""]);
//! let probe = StatisticalProbe::new(Arc::new(ChardetngClassifier::new()), filter);
//! assert!(probe.detect(b"").is_none());
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chardetng::EncodingDetector;
use tracing::debug;

use super::error::CharsetError;
use super::registry::resolve;
use super::result::{Detection, DetectionSource};

/// One classifier guess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Charset label as reported by the classifier.
    pub charset: String,
    /// Language tag, empty when unknown.
    pub language: String,
}

impl Candidate {
    /// Creates a candidate.
    pub fn new(charset: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            charset: charset.into(),
            language: language.into(),
        }
    }
}

/// A statistical charset classifier.
pub trait Classifier: Send + Sync {
    /// Returns candidates ordered by descending confidence.
    ///
    /// # Errors
    ///
    /// Returns [`CharsetError::NotDetected`] when the buffer is too small or
    /// too ambiguous to classify.
    fn detect_all(&self, buffer: &[u8]) -> Result<Vec<Candidate>, CharsetError>;
}

/// Total order over candidates; `Less` means the first is preferred.
pub type Preference = Arc<dyn Fn(&Candidate, &Candidate) -> Ordering + Send + Sync>;

/// Restricts and reorders classifier candidates.
///
/// Built once and never mutated, so one filter can back concurrent probes.
#[derive(Clone, Default)]
pub struct ResultFilter {
    charsets: Option<HashSet<String>>,
    languages: Option<HashSet<String>>,
    preference: Option<Preference>,
}

impl ResultFilter {
    /// A filter that keeps every candidate in classifier order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only candidates whose charset is listed (ASCII case-insensitive).
    #[must_use]
    pub fn with_charsets<I, S>(mut self, charsets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.charsets = Some(
            charsets
                .into_iter()
                .map(|c| c.as_ref().to_ascii_lowercase())
                .collect(),
        );
        self
    }

    /// Keeps only candidates whose language is listed exactly.
    ///
    /// Include `""` to keep candidates without a language.
    #[must_use]
    pub fn with_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.languages = Some(
            languages
                .into_iter()
                .map(|l| l.as_ref().to_string())
                .collect(),
        );
        self
    }

    /// Reorders surviving candidates with `preference`.
    #[must_use]
    pub fn with_preference<F>(mut self, preference: F) -> Self
    where
        F: Fn(&Candidate, &Candidate) -> Ordering + Send + Sync + 'static,
    {
        self.preference = Some(Arc::new(preference));
        self
    }

    /// Reorders candidates so that earlier-listed charsets come first.
    ///
    /// Unlisted charsets keep their relative order after the listed ones.
    #[must_use]
    pub fn with_preferred_charsets<I, S>(self, ranked: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let ranked: Vec<String> = ranked
            .into_iter()
            .map(|c| c.as_ref().to_ascii_lowercase())
            .collect();
        self.with_preference(move |a, b| {
            let rank = |candidate: &Candidate| {
                let charset = candidate.charset.to_ascii_lowercase();
                ranked
                    .iter()
                    .position(|c| *c == charset)
                    .unwrap_or(ranked.len())
            };
            rank(a).cmp(&rank(b))
        })
    }

    /// Applies the charset filter, then the language filter, then the
    /// preference ordering.
    #[must_use]
    pub fn apply(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        if let Some(charsets) = &self.charsets {
            candidates.retain(|c| charsets.contains(&c.charset.to_ascii_lowercase()));
        }
        if let Some(languages) = &self.languages {
            candidates.retain(|c| languages.contains(&c.language));
        }
        if let Some(preference) = &self.preference {
            candidates.sort_by(|a, b| preference(a, b));
        }
        candidates
    }
}

impl fmt::Debug for ResultFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultFilter")
            .field("charsets", &self.charsets)
            .field("languages", &self.languages)
            .field("preference", &self.preference.is_some())
            .finish()
    }
}

/// Runs a classifier over a buffer and picks the best filtered candidate.
#[derive(Clone)]
pub struct StatisticalProbe {
    classifier: Arc<dyn Classifier>,
    filter: ResultFilter,
}

impl StatisticalProbe {
    /// Creates a probe from a classifier and a filter.
    #[must_use]
    pub fn new(classifier: Arc<dyn Classifier>, filter: ResultFilter) -> Self {
        Self { classifier, filter }
    }

    /// A probe over [`ChardetngClassifier`] without filtering.
    #[must_use]
    pub fn chardetng() -> Self {
        Self::new(Arc::new(ChardetngClassifier::new()), ResultFilter::new())
    }

    /// Returns the active filter.
    #[must_use]
    pub fn filter(&self) -> &ResultFilter {
        &self.filter
    }

    /// Classifies `buffer`, returning an uncertain detection or `None`.
    #[must_use]
    pub fn detect(&self, buffer: &[u8]) -> Option<Detection> {
        match self.try_detect(buffer) {
            Ok(detection) => Some(detection),
            Err(e) => {
                debug!(error = %e, "statistical probe declined");
                None
            }
        }
    }

    fn try_detect(&self, buffer: &[u8]) -> Result<Detection, CharsetError> {
        let candidates = self.classifier.detect_all(buffer)?;
        let total = candidates.len();
        let best = self
            .filter
            .apply(candidates)
            .into_iter()
            .next()
            .ok_or(CharsetError::NotDetected)?;
        debug!(
            charset = %best.charset,
            language = %best.language,
            candidates = total,
            "statistical probe picked candidate"
        );
        let encoding = resolve(&best.charset)?;
        Ok(Detection::new(encoding, false, DetectionSource::Statistical))
    }
}

impl fmt::Debug for StatisticalProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticalProbe")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// [`Classifier`] backed by `chardetng`.
///
/// `chardetng` produces a single guess without a language, so the language is
/// derived from the encoding family. All-ASCII input is reported as not
/// detected because any ASCII-compatible encoding fits it.
#[derive(Debug, Clone)]
pub struct ChardetngClassifier {
    tld: Option<String>,
    allow_utf8: bool,
}

impl Default for ChardetngClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChardetngClassifier {
    /// Creates a classifier that may guess UTF-8 and has no TLD hint.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tld: None,
            allow_utf8: true,
        }
    }

    /// Uses the top-level domain of the content's origin as a hint, e.g. `"jp"`.
    ///
    /// A label that [`normalize_tld`] rejects, such as `"co.jp"`, is dropped
    /// and the classifier runs without a hint.
    #[must_use]
    pub fn with_tld(mut self, tld: impl AsRef<str>) -> Self {
        let tld = tld.as_ref();
        self.tld = normalize_tld(tld);
        if self.tld.is_none() {
            debug!(tld, "ignoring malformed TLD hint");
        }
        self
    }

    /// Controls whether UTF-8 may be guessed.
    #[must_use]
    pub fn allow_utf8(mut self, allow: bool) -> Self {
        self.allow_utf8 = allow;
        self
    }
}

impl Classifier for ChardetngClassifier {
    fn detect_all(&self, buffer: &[u8]) -> Result<Vec<Candidate>, CharsetError> {
        let mut detector = EncodingDetector::new();
        // The buffer is a prefix of a longer stream, never its end.
        if !detector.feed(buffer, false) {
            return Err(CharsetError::NotDetected);
        }
        let encoding = detector.guess(self.tld.as_deref().map(str::as_bytes), self.allow_utf8);
        let charset = encoding.name().to_ascii_lowercase();
        let language = language_for_charset(&charset);
        Ok(vec![Candidate::new(charset, language)])
    }
}

/// Normalizes a top-level domain hint to a bare lowercase label.
///
/// A leading dot is dropped. Returns `None` unless what remains is non-empty
/// ASCII alphanumeric, which is all `chardetng` accepts.
#[must_use]
pub fn normalize_tld(tld: &str) -> Option<String> {
    let label = tld.trim().trim_start_matches('.');
    (!label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric()))
        .then(|| label.to_ascii_lowercase())
}

/// Best-effort language tag for an encoding family.
fn language_for_charset(charset: &str) -> &'static str {
    match charset {
        "shift_jis" | "euc-jp" | "iso-2022-jp" => "ja",
        "gbk" | "gb18030" | "big5" => "zh",
        "euc-kr" => "ko",
        "windows-1251" | "koi8-r" | "koi8-u" | "ibm866" | "iso-8859-5" | "x-mac-cyrillic" => "ru",
        "windows-1253" | "iso-8859-7" => "el",
        "windows-1254" => "tr",
        "windows-1255" | "iso-8859-8" | "iso-8859-8-i" => "he",
        "windows-1256" | "iso-8859-6" => "ar",
        "windows-874" => "th",
        "windows-1258" => "vi",
        _ => "",
    }
}

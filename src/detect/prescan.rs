//! `<meta>` charset prescanning of leading markup.
//!
//! A small tag scanner walks the first [`LOOKAHEAD_LEN`] bytes of a document
//! looking for `<meta>` start tags. Each such tag is folded into a
//! [`MetaTagState`], which decides whether the tag declares a usable charset:
//!
//! - `<meta charset="...">` declares one directly.
//! - `<meta http-equiv="Content-Type" content="...; charset=...">` declares one
//!   through the pragma, and is only honored when the `http-equiv` attribute is
//!   present.
//!
//! Only the first occurrence of an attribute name in a tag counts. Comments,
//! end tags, doctypes and the contents of raw text elements such as `<script>`
//! are skipped. A tag left unterminated at the end of the window ends the scan.

use std::collections::HashSet;

use tracing::{debug, trace};

use super::constants::LOOKAHEAD_LEN;
use super::registry::{EncodingHandle, lookup, resolve};
use super::result::{Detection, DetectionSource};

/// Elements whose content is raw text and cannot contain tags.
const RAW_TEXT_ELEMENTS: [&str; 10] = [
    "iframe", "noembed", "noframes", "noscript", "plaintext", "script", "style", "textarea",
    "title", "xmp",
];

/// Scans the leading markup of `content` for a `<meta>` charset declaration.
///
/// Returns `None` when no tag declares a resolvable charset within the window.
#[must_use]
pub fn prescan(content: &[u8]) -> Option<Detection> {
    let window = &content[..content.len().min(LOOKAHEAD_LEN)];
    let mut scanner = TagScanner::new(window);

    while let Some(tag) = scanner.next_start_tag() {
        if tag.name != "meta" {
            continue;
        }
        let mut state = MetaTagState::default();
        for (name, value) in &tag.attributes {
            state.observe(name, value);
        }
        trace!(?state, "scanned meta tag");
        if let Some(detection) = state.decide() {
            debug!(encoding = %detection.name, "meta prescan found charset");
            return Some(detection);
        }
    }
    None
}

/// Extracts the charset label embedded in a `content` attribute value,
/// as in `text/html; charset=Shift_JIS`.
///
/// The value is lowercased first. The label is either quoted or runs until
/// whitespace or `;`.
#[must_use]
pub fn charset_from_content(content: &str) -> Option<String> {
    let lowered = content.to_ascii_lowercase();
    let position = lowered.find("charset")?;
    let rest = lowered[position + "charset".len()..].trim_start_matches(is_html_space);
    let rest = rest.strip_prefix('=')?.trim_start_matches(is_html_space);

    let first = rest.chars().next()?;
    if first == '"' || first == '\'' {
        let quoted = &rest[1..];
        let end = quoted.find(first)?;
        return Some(quoted[..end].to_string());
    }

    let end = rest
        .find(|c: char| c == ';' || is_html_space(c))
        .unwrap_or(rest.len());
    Some(rest[..end].to_string())
}

fn is_html_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\x0C' | '\r')
}

/// Whether a `<meta>` tag needs `http-equiv="content-type"` to be honored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum PragmaRequirement {
    /// No charset-bearing attribute seen yet.
    #[default]
    Unknown,
    /// The candidate came from a `content` attribute.
    Required,
    /// The candidate came from a bare `charset` attribute.
    NotRequired,
}

/// Parse state of a single `<meta>` tag.
#[derive(Debug, Default)]
struct MetaTagState {
    seen_attributes: HashSet<String>,
    got_pragma: bool,
    need_pragma: PragmaRequirement,
    candidate: Option<EncodingHandle>,
}

impl MetaTagState {
    fn observe(&mut self, name: &str, value: &str) {
        if !self.seen_attributes.insert(name.to_string()) {
            return;
        }
        let value = value.to_ascii_lowercase();

        match name {
            "http-equiv" => {
                if value == "content-type" {
                    self.got_pragma = true;
                }
            }
            "content" => {
                if self.candidate.is_some() {
                    return;
                }
                let Some(label) = charset_from_content(&value) else {
                    return;
                };
                match resolve(&label) {
                    Ok(encoding) => {
                        self.candidate = Some(encoding);
                        self.need_pragma = PragmaRequirement::Required;
                    }
                    Err(e) => debug!(error = %e, "ignoring meta content charset"),
                }
            }
            "charset" => {
                self.candidate = lookup(&value);
                self.need_pragma = PragmaRequirement::NotRequired;
            }
            _ => {}
        }
    }

    fn decide(self) -> Option<Detection> {
        match (self.need_pragma, self.got_pragma) {
            (PragmaRequirement::Unknown, _) | (PragmaRequirement::Required, false) => None,
            _ => self.candidate.map(|encoding| {
                // A document readable far enough to find the tag is not UTF-16.
                if encoding.canonical_name().starts_with("utf-16") {
                    Detection::renamed(
                        EncodingHandle::utf8(),
                        "utf-8",
                        false,
                        DetectionSource::MetaPrescan,
                    )
                } else {
                    Detection::new(encoding, false, DetectionSource::MetaPrescan)
                }
            }),
        }
    }
}

/// A start tag with lowercased name and attribute names.
#[derive(Debug, PartialEq, Eq)]
struct StartTag {
    name: String,
    attributes: Vec<(String, String)>,
}

/// Minimal HTML tag scanner over a byte window.
///
/// Yields start (and self-closing) tags in document order. Returns `None` once
/// the input is exhausted or ends inside an unterminated construct.
struct TagScanner<'a> {
    input: &'a [u8],
    pos: usize,
    raw_text_end: Option<String>,
}

impl<'a> TagScanner<'a> {
    fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            pos: 0,
            raw_text_end: None,
        }
    }

    fn next_start_tag(&mut self) -> Option<StartTag> {
        if let Some(element) = self.raw_text_end.take() {
            self.skip_raw_text(&element)?;
        }

        loop {
            let offset = self.input[self.pos..].iter().position(|&b| b == b'<')?;
            self.pos += offset + 1;

            match self.peek()? {
                b'!' => self.skip_markup_declaration()?,
                b'/' => {
                    self.pos += 1;
                    self.skip_past(b">")?;
                }
                b'?' => self.skip_past(b">")?,
                c if c.is_ascii_alphabetic() => {
                    let tag = self.read_start_tag()?;
                    if RAW_TEXT_ELEMENTS.contains(&tag.name.as_str()) {
                        self.raw_text_end = Some(tag.name.clone());
                    }
                    return Some(tag);
                }
                // A stray '<' is plain text.
                _ => {}
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn skip_past(&mut self, needle: &[u8]) -> Option<()> {
        let offset = self.input[self.pos..]
            .windows(needle.len())
            .position(|window| window == needle)?;
        self.pos += offset + needle.len();
        Some(())
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| is_html_space(char::from(b))) {
            self.pos += 1;
        }
    }

    /// Skips `<!-- ... -->`, `<!DOCTYPE ...>` and other `<!...>` constructs.
    ///
    /// The abruptly closed comments `<!-->` and `<!--->` end at their `>`.
    fn skip_markup_declaration(&mut self) -> Option<()> {
        self.pos += 1;
        if !self.input[self.pos..].starts_with(b"--") {
            return self.skip_past(b">");
        }
        self.pos += 2;
        let rest = &self.input[self.pos..];
        if rest.starts_with(b">") {
            self.pos += 1;
            Some(())
        } else if rest.starts_with(b"->") {
            self.pos += 2;
            Some(())
        } else {
            self.skip_past(b"-->")
        }
    }

    /// Skips the content of a raw text element up to and including its end tag.
    fn skip_raw_text(&mut self, element: &str) -> Option<()> {
        let end_tag_len = element.len() + 2;
        loop {
            let offset = self.input[self.pos..].iter().position(|&b| b == b'<')?;
            self.pos += offset;
            let candidate = self.input.get(self.pos..self.pos + end_tag_len)?;
            let closes =
                candidate[1] == b'/' && candidate[2..].eq_ignore_ascii_case(element.as_bytes());
            self.pos += 1;
            if closes {
                return self.skip_past(b">");
            }
        }
    }

    fn read_start_tag(&mut self) -> Option<StartTag> {
        let name = self.read_while(|b| !matches!(b, b'/' | b'>') && !is_html_space(char::from(b)));
        let mut attributes = Vec::new();

        loop {
            while self
                .peek()
                .is_some_and(|b| b == b'/' || is_html_space(char::from(b)))
            {
                self.pos += 1;
            }
            if self.peek()? == b'>' {
                self.pos += 1;
                return Some(StartTag { name, attributes });
            }

            // The first character of a name may be '='.
            let first = self.input[self.pos];
            self.pos += 1;
            let mut key = char::from(first.to_ascii_lowercase()).to_string();
            key.push_str(&self.read_while(|b| {
                !matches!(b, b'/' | b'>' | b'=') && !is_html_space(char::from(b))
            }));

            self.skip_whitespace();
            let value = if self.peek()? == b'=' {
                self.pos += 1;
                self.skip_whitespace();
                self.read_attribute_value()?
            } else {
                String::new()
            };
            attributes.push((key, value));
        }
    }

    fn read_attribute_value(&mut self) -> Option<String> {
        match self.peek()? {
            quote @ (b'"' | b'\'') => {
                self.pos += 1;
                let offset = self.input[self.pos..].iter().position(|&b| b == quote)?;
                let value = String::from_utf8_lossy(&self.input[self.pos..self.pos + offset]);
                self.pos += offset + 1;
                Some(value.into_owned())
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|b| b != b'>' && !is_html_space(char::from(b)))
                {
                    self.pos += 1;
                }
                Some(String::from_utf8_lossy(&self.input[start..self.pos]).into_owned())
            }
        }
    }

    /// Reads a run of bytes matching `accept`, lowercased.
    fn read_while(&mut self, accept: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&accept) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.input[start..self.pos]).to_ascii_lowercase()
    }
}

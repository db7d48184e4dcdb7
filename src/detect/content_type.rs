//! Charset extraction from a declared Content-Type.

use std::borrow::Cow;

use mime::Mime;

use super::error::CharsetError;
use super::registry::{EncodingHandle, resolve};

/// Returns the charset label declared in a media type, if any.
///
/// # Errors
///
/// Returns [`CharsetError::MalformedContentType`] when the value does not
/// parse as a media type (including the empty string).
pub fn declared_charset(content_type: &str) -> Result<Option<String>, CharsetError> {
    let media_type: Mime = tighten_parameters(content_type.trim())
        .parse()
        .map_err(|e| CharsetError::malformed_content_type(content_type, e))?;
    Ok(media_type
        .get_param(mime::CHARSET)
        .map(|charset| charset.as_str().trim_matches('"').to_string()))
}

/// Drops spaces and tabs around `=` outside quoted strings, so that
/// `charset = utf-8` parses like `charset=utf-8`.
fn tighten_parameters(content_type: &str) -> Cow<'_, str> {
    if !content_type.contains('=') {
        return Cow::Borrowed(content_type);
    }
    let mut out = String::with_capacity(content_type.len());
    let mut quoted = false;
    let mut escaped = false;
    let mut chars = content_type.chars().peekable();
    while let Some(c) = chars.next() {
        if quoted {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                quoted = false;
            }
            continue;
        }
        match c {
            '"' => {
                quoted = true;
                out.push(c);
            }
            '=' => {
                out.truncate(out.trim_end_matches([' ', '\t']).len());
                out.push(c);
                while chars.next_if(|next| matches!(next, ' ' | '\t')).is_some() {}
            }
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

/// Resolves the `charset` parameter of a Content-Type value.
///
/// Returns `Ok(None)` when the media type has no charset parameter.
///
/// # Errors
///
/// Returns [`CharsetError::MalformedContentType`] for an unparseable value and
/// [`CharsetError::UnresolvableCharset`] for an unknown charset label.
pub fn content_type_charset(content_type: &str) -> Result<Option<EncodingHandle>, CharsetError> {
    declared_charset(content_type)?
        .map(|label| resolve(&label))
        .transpose()
}

//! Integration tests for the detection cascade.
//!
//! These tests drive `determine_encoding` and `EncodingResolver` through the
//! public API only.

use std::sync::Arc;

use charsniff_core::detect::{
    Candidate, CharsetError, Classifier, DetectionSource, EncodingResolver, LOOKAHEAD_LEN,
    ResultFilter, StatisticalProbe, determine_encoding,
};

/// Classifier that always answers with a fixed candidate list.
struct FixedClassifier(Vec<Candidate>);

impl Classifier for FixedClassifier {
    fn detect_all(&self, _buffer: &[u8]) -> Result<Vec<Candidate>, CharsetError> {
        if self.0.is_empty() {
            return Err(CharsetError::NotDetected);
        }
        Ok(self.0.clone())
    }
}

fn fixed_probe(candidates: &[(&str, &str)], filter: ResultFilter) -> StatisticalProbe {
    let candidates = candidates
        .iter()
        .map(|(charset, language)| Candidate::new(*charset, *language))
        .collect();
    StatisticalProbe::new(Arc::new(FixedClassifier(candidates)), filter)
}

#[test]
fn test_utf16be_bom_wins_over_everything() {
    let mut buffer = vec![0xFE, 0xFF];
    buffer.extend_from_slice(b"<meta charset=\"shift_jis\">");
    let probe = fixed_probe(&[("euc-jp", "ja")], ResultFilter::new());

    let detection = determine_encoding(&buffer, "text/html; charset=iso-8859-2", Some(&probe));
    assert_eq!(detection.name, "utf-16be");
    assert!(detection.certain);
    assert_eq!(detection.source, DetectionSource::Bom);
}

#[test]
fn test_content_type_wins_over_meta_declaration() {
    let buffer = b"<html><head><meta charset=\"utf-8\"></head></html>";
    let detection = determine_encoding(buffer, "text/html; charset=shift_jis", None);
    assert_eq!(detection.name, "shift_jis");
    assert!(detection.certain);
    assert_eq!(detection.source, DetectionSource::ContentType);
}

#[test]
fn test_unresolvable_content_type_cedes_to_meta() {
    let buffer = b"<meta charset=\"Shift_JIS\">";
    let detection = determine_encoding(buffer, "text/html; charset=x-no-such-thing", None);
    assert_eq!(detection.name, "shift_jis");
    assert!(!detection.certain);
    assert_eq!(detection.source, DetectionSource::MetaPrescan);
}

#[test]
fn test_malformed_content_type_cedes_to_meta() {
    let buffer = b"<meta charset=\"EUC-JP\">";
    let detection = determine_encoding(buffer, ";;;not a media type", None);
    assert_eq!(detection.name, "euc-jp");
    assert_eq!(detection.source, DetectionSource::MetaPrescan);
}

#[test]
fn test_meta_charset_as_first_bytes() {
    let detection = determine_encoding(b"<meta charset=\"Shift_JIS\">", "", None);
    assert_eq!(detection.name, "shift_jis");
    assert!(!detection.certain);
}

#[test]
fn test_pragma_without_charset_then_bare_charset() {
    let buffer = br#"<meta http-equiv="Content-Type" content="text/html"><meta charset="EUC-JP">"#;
    let detection = determine_encoding(buffer, "", None);
    assert_eq!(detection.name, "euc-jp");
    assert_eq!(detection.source, DetectionSource::MetaPrescan);
}

#[test]
fn test_content_charset_without_pragma_is_ignored() {
    let mut buffer = br#"<meta content="text/html;charset=windows-1252">"#.to_vec();
    buffer.extend_from_slice("<p>Grüße</p>".as_bytes());

    let detection = determine_encoding(&buffer, "", None);
    assert_ne!(detection.source, DetectionSource::MetaPrescan);
    assert_eq!(detection.name, "utf-8");
    assert_eq!(detection.source, DetectionSource::Utf8Heuristic);
}

#[test]
fn test_content_charset_with_pragma_resolves() {
    let buffer = br#"<meta http-equiv="content-type" content="text/html; charset=windows-1251">"#;
    let detection = determine_encoding(buffer, "", None);
    assert_eq!(detection.name, "windows-1251");
    assert_eq!(detection.source, DetectionSource::MetaPrescan);
}

#[test]
fn test_meta_utf16_is_rewritten_to_utf8() {
    let detection = determine_encoding(b"<meta charset=\"UTF-16LE\">", "", None);
    assert_eq!(detection.name, "utf-8");
    assert!(!detection.certain);
    assert!(detection.encoding.is_identity());
}

#[test]
fn test_content_type_utf16_is_not_rewritten() {
    let detection = determine_encoding(b"", "text/plain; charset=utf-16le", None);
    assert_eq!(detection.name, "utf-16le");
    assert!(detection.certain);
}

#[test]
fn test_plain_utf8_text_resolves_to_utf8_uncertain() {
    let detection = determine_encoding("日本語のテキスト".as_bytes(), "", None);
    assert_eq!(detection.name, "utf-8");
    assert!(!detection.certain);
    assert_eq!(detection.source, DetectionSource::Utf8Heuristic);
}

#[test]
fn test_invalid_high_bit_bytes_resolve_to_default() {
    let detection = determine_encoding(&[0xC3, 0x28, 0xA0, 0xA1, 0xFF], "", None);
    assert_eq!(detection.name, "windows-1252");
    assert!(!detection.certain);
    assert_eq!(detection.source, DetectionSource::Default);
}

#[test]
fn test_pure_ascii_resolves_to_default() {
    let detection = determine_encoding(b"plain ascii body", "", None);
    assert_eq!(detection.name, "windows-1252");
    assert_eq!(detection.source, DetectionSource::Default);
}

#[test]
fn test_utf8_sequence_cut_at_window_edge_is_still_utf8() {
    // The window ends on the lead byte of "ü".
    let mut buffer = "é".as_bytes().to_vec();
    buffer.resize(LOOKAHEAD_LEN - 1, b' ');
    buffer.extend_from_slice("ü".as_bytes());
    let detection = determine_encoding(&buffer, "", None);
    assert_eq!(detection.name, "utf-8");
}

#[test]
fn test_meta_beyond_lookahead_window_is_not_seen() {
    let mut buffer = vec![b' '; LOOKAHEAD_LEN];
    buffer.extend_from_slice(b"<meta charset=\"shift_jis\">");
    let detection = determine_encoding(&buffer, "", None);
    assert_eq!(detection.source, DetectionSource::Default);
}

#[test]
fn test_statistical_result_is_uncertain() {
    let probe = fixed_probe(&[("EUC-JP", "ja")], ResultFilter::new());
    let detection = determine_encoding(&[0xA4, 0xB3, 0xA4, 0xF3], "", Some(&probe));
    assert_eq!(detection.name, "euc-jp");
    assert!(!detection.certain);
    assert_eq!(detection.source, DetectionSource::Statistical);
}

#[test]
fn test_meta_outranks_statistical_probe() {
    let probe = fixed_probe(&[("euc-jp", "ja")], ResultFilter::new());
    let detection = determine_encoding(b"<meta charset=\"koi8-r\">", "", Some(&probe));
    assert_eq!(detection.name, "koi8-r");
    assert_eq!(detection.source, DetectionSource::MetaPrescan);
}

#[test]
fn test_language_filter_mismatch_falls_through_to_heuristic() {
    let filter = ResultFilter::new().with_languages(["ja"]);
    let probe = fixed_probe(&[("koi8-r", "ru"), ("windows-1251", "ru")], filter);
    let resolver = EncodingResolver::with_probe(probe);

    let utf8 = resolver.resolve("Привет, мир".as_bytes(), "");
    assert_eq!(utf8.source, DetectionSource::Utf8Heuristic);

    let legacy = resolver.resolve(&[0xF0, 0xD2, 0xC9, 0xD7, 0xC5, 0xD4], "");
    assert_eq!(legacy.source, DetectionSource::Default);
    assert_eq!(legacy.name, "windows-1252");
}

#[test]
fn test_charset_filter_and_preference_pick_candidate() {
    let filter = ResultFilter::new()
        .with_charsets(["Shift_JIS", "EUC-JP"])
        .with_preferred_charsets(["euc-jp"]);
    let probe = fixed_probe(
        &[("windows-1252", ""), ("shift_jis", "ja"), ("euc-jp", "ja")],
        filter,
    );
    let detection = determine_encoding(&[0x82, 0xA0], "", Some(&probe));
    assert_eq!(detection.name, "euc-jp");
}

#[test]
fn test_empty_language_allowed_explicitly() {
    let filter = ResultFilter::new().with_languages(["ja", ""]);
    let probe = fixed_probe(&[("iso-8859-2", "")], filter);
    let detection = determine_encoding(&[0xB1, 0xE6], "", Some(&probe));
    assert_eq!(detection.name, "iso-8859-2");
    assert_eq!(detection.source, DetectionSource::Statistical);
}

#[test]
fn test_unresolvable_candidate_is_no_result() {
    let probe = fixed_probe(&[("x-made-up", "")], ResultFilter::new());
    let detection = determine_encoding(&[0xB1, 0xE6], "", Some(&probe));
    assert_eq!(detection.source, DetectionSource::Default);
}

#[test]
fn test_chardetng_probe_detects_shift_jis_page() {
    let text = "日本語のウェブページです。文字コードを判定します。".repeat(8);
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(&text);
    let resolver = EncodingResolver::with_probe(StatisticalProbe::chardetng());

    let detection = resolver.resolve(&bytes, "text/html");
    assert_eq!(detection.name, "shift_jis");
    assert_eq!(detection.source, DetectionSource::Statistical);
}

#[test]
fn test_resolver_is_shareable_across_threads() {
    let resolver = Arc::new(EncodingResolver::with_probe(StatisticalProbe::chardetng()));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let resolver = Arc::clone(&resolver);
            std::thread::spawn(move || resolver.resolve(b"<meta charset=\"gbk\">", "").name)
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), "gbk");
    }
}

#[test]
fn test_detection_serializes_without_handle() {
    let detection = determine_encoding(b"", "text/html; charset=euc-kr", None);
    let json = serde_json::to_value(&detection).unwrap();
    assert_eq!(json["name"], "euc-kr");
    assert_eq!(json["certain"], true);
    assert_eq!(json["source"], "content_type");
    assert!(json.get("encoding").is_none());
}

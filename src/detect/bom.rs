//! Byte order mark sniffing.

use super::registry::lookup;
use super::result::{Detection, DetectionSource};

/// Known byte order marks, checked in order.
const BOMS: [(&[u8], &str); 3] = [
    (&[0xFE, 0xFF], "utf-16be"),
    (&[0xFF, 0xFE], "utf-16le"),
    (&[0xEF, 0xBB, 0xBF], "utf-8"),
];

/// Returns a certain detection when `content` starts with a byte order mark.
#[must_use]
pub fn sniff_bom(content: &[u8]) -> Option<Detection> {
    BOMS.iter()
        .find(|(bom, _)| content.starts_with(bom))
        .and_then(|(_, label)| lookup(label))
        .map(|encoding| Detection::new(encoding, true, DetectionSource::Bom))
}

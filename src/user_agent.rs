//! User-Agent string sent with fetch requests.

/// Product token for User-Agent identification.
const PRODUCT: &str = "charsniff";

/// Default User-Agent for fetch requests (identifies the tool and version).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("{PRODUCT}/{version} (charset-detection-tool)")
}

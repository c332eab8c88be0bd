//! Hidden identity marker embedded in ticket bodies.
//!
//! The marker is a trailing HTML comment carrying the 16-character identity
//! hash: `<!-- stitch-id: 0123456789abcdef -->`. It joins tickets to work
//! items independent of title text. This module is the only place the marker
//! is serialized or parsed; everywhere else the identity travels as the
//! structured [`Identity`] field on the ticket model.

use stitch_core::Identity;

const MARKER_PREFIX: &str = "<!-- stitch-id: ";
const MARKER_SUFFIX: &str = " -->";

/// Append the marker to a body, trailing after a blank line.
pub fn append_marker(body: &str, identity: &Identity) -> String {
    format!(
        "{}\n\n{MARKER_PREFIX}{identity}{MARKER_SUFFIX}",
        body.trim_end()
    )
}

/// Extract the identity from a body's marker, if present.
pub fn extract_marker(body: &str) -> Option<Identity> {
    let start = body.rfind(MARKER_PREFIX)? + MARKER_PREFIX.len();
    let rest = &body[start..];
    let end = rest.find(MARKER_SUFFIX)?;
    Identity::parse(rest[..end].trim())
}

/// Remove the marker (and surrounding whitespace) from a body.
pub fn strip_marker(body: &str) -> String {
    match body.rfind(MARKER_PREFIX) {
        Some(start) => {
            let rest = &body[start..];
            match rest.find(MARKER_SUFFIX) {
                Some(end) => {
                    let tail = &rest[end + MARKER_SUFFIX.len()..];
                    format!("{}{}", &body[..start], tail).trim().to_owned()
                }
                None => body.trim().to_owned(),
            }
        }
        None => body.trim().to_owned(),
    }
}

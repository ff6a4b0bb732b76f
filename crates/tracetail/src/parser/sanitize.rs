//! Value scrubbing applied after decode.
//!
//! Two capture-tool artifacts can leak into decoded values: chunk-reassembly
//! markers that survived because the producer split mid-value, and doubled
//! percent signs (one sink passes messages through a native format-string
//! call, so the producer escapes `%` as `%%`).

use std::borrow::Cow;

use crate::chunk::ANY_MARKER;

/// Strip leaked chunk markers and unescape `%%`, trimming whitespace the
/// removal leaves behind.
pub fn sanitize(value: &str) -> String {
    let stripped: Cow<'_, str> = ANY_MARKER.replace_all(value, "");
    stripped.replace("%%", "%").trim().to_string()
}

/// Sanitize, mapping an emptied-out result to `None`.
pub fn sanitize_opt(value: &str) -> Option<String> {
    let cleaned = sanitize(value);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

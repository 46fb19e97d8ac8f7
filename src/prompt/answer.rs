//! Answer extraction from raw generated text.

/// Header that closes every prompt.
pub const RESPONSE_HEADER: &str = "### Response:";

/// Marker the answer is located by: the response header and its line break.
pub const RESPONSE_MARKER: &str = "### Response:\n";

/// Return the text after the last [`RESPONSE_MARKER`] in `raw`.
///
/// When the marker is missing the whole input is returned unchanged.
#[must_use]
pub fn extract_answer(raw: &str) -> &str {
    raw.rfind(RESPONSE_MARKER)
        .map_or(raw, |idx| &raw[idx + RESPONSE_MARKER.len()..])
}

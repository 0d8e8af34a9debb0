//! Path segment encoding for resource identifiers.
//!
//! Identifiers handed to the navigator are user input and may contain any
//! character. They are interpolated into URL paths as a single segment, so
//! everything outside the RFC 3986 unreserved set (plus a few sub-delims that
//! are harmless inside a segment) is percent-encoded. In particular `/` is
//! escaped so an identifier can never introduce extra path levels.
//!
//! URL parsers treat `.` and `..` (and their `%2E` spellings) as dot segments
//! and resolve them away, so those two identifiers cannot travel as a path
//! segment at all. They are emitted with the escape itself escaped
//! (`%252E`), which keeps them in place as one opaque segment.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

/// Characters that must be percent-encoded in a single path segment.
const PATH_SEGMENT_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Escaped form of `.` that no URL parser treats as a dot segment.
const ESCAPED_DOT: &str = "%252E";

/// Percent-encode an identifier as one URL path segment.
///
/// # Examples
///
/// ```
/// use csapi_core::encode_path_segment;
///
/// assert_eq!(encode_path_segment("0s2lbn2n1bnc"), "0s2lbn2n1bnc");
/// assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
/// assert_eq!(encode_path_segment("urn:osh:sensor:1"), "urn:osh:sensor:1");
/// assert_eq!(encode_path_segment(".."), "%252E%252E");
/// ```
#[must_use]
pub fn encode_path_segment(id: &str) -> String {
    if is_dot_segment(id) {
        return ESCAPED_DOT.repeat(id.len());
    }
    utf8_percent_encode(id, PATH_SEGMENT_ESCAPE).to_string()
}

fn is_dot_segment(id: &str) -> bool {
    id == "." || id == ".."
}

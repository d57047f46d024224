//! Reversible encoding of object paths used as cache-index keys and queue members

use std::borrow::Cow;

/// Percent-encode an object path; `/` and non-ASCII are escaped
pub fn encode_path(path: &str) -> Cow<'_, str> {
    urlencoding::encode(path)
}

/// Inverse of [`encode_path`]; fails on malformed escapes or invalid UTF-8
pub fn decode_path(encoded: &str) -> Option<String> {
    if has_malformed_escape(encoded) {
        return None;
    }
    urlencoding::decode(encoded).ok().map(Cow::into_owned)
}

// urlencoding passes a stray '%' through untouched; treat it as corrupt
fn has_malformed_escape(encoded: &str) -> bool {
    let bytes = encoded.as_bytes();
    bytes.iter().enumerate().any(|(i, &b)| {
        b == b'%'
            && !(bytes.get(i + 1).is_some_and(u8::is_ascii_hexdigit)
                && bytes.get(i + 2).is_some_and(u8::is_ascii_hexdigit))
    })
}

//! Input checks shared by the request extractors.

/// Session ids and request ids: 1-128 chars, ASCII letters, digits, `-` and `_`.
pub fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 128
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

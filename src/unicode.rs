//! Character-level classification used by the converter.

/// Ideographic (full-width) space U+3000.
pub const ZENKAKU_SPACE: char = '\u{3000}';

/// Half-width or full-width whitespace that can appear inside a surface form.
pub fn is_space(c: char) -> bool {
    c == ' ' || c == ZENKAKU_SPACE || c == '\t'
}

/// True for a non-empty string made only of whitespace.
pub fn is_blank(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_space)
}

/// Digits that may be glued together by `merge_number`: ASCII, full-width,
/// and any other Unicode numeric character (Ⅻ, ①, ...).
pub fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || ('０'..='９').contains(&c) || c.is_numeric()
}

pub fn is_numeric_str(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_numeric_char)
}

pub fn is_ascii_only(s: &str) -> bool {
    !s.is_empty() && s.is_ascii()
}

/// Round opening parentheses that start an appositive span.
pub fn is_open_paren(s: &str) -> bool {
    matches!(s, "(" | "（")
}

pub fn is_close_paren(s: &str) -> bool {
    matches!(s, ")" | "）")
}

/// Split trailing whitespace off a surface form.
///
/// Returns the trimmed surface and whether anything was removed.
pub fn strip_trailing_space(s: &str) -> (&str, bool) {
    let trimmed = s.trim_end_matches(is_space);
    (trimmed, trimmed.len() != s.len())
}

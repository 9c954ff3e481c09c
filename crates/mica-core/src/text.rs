//! UTF-8–safe string truncation utilities.
//!
//! Rust `&str[..n]` panics when `n` falls inside a multi-byte character.
//! These helpers find the nearest char boundary so truncation is always safe.

/// Truncate a string to at most `max_bytes` bytes at a char boundary.
///
/// Returns the longest prefix of `s` whose byte length is ≤ `max_bytes`
/// and that does not split a multi-byte character.
#[inline]
#[must_use]
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    // `floor_char_boundary` is nightly-only, so implement it ourselves.
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Truncate `s` and append `suffix` if the original exceeds `max_bytes`.
///
/// Unlike a budget-inclusive cut, the suffix is appended after the cut so a
/// truncated value reads `"<prefix>{suffix}"` with the prefix alone fitting
/// the budget. If the string fits, it is returned unchanged.
#[must_use]
pub fn truncate_marked(s: &str, max_bytes: usize, suffix: &str) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    format!("{}{suffix}", truncate_str(s, max_bytes))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_within_limit() {
        assert_eq!(truncate_str("hello", 10), "hello");
    }

    #[test]
    fn ascii_truncated() {
        assert_eq!(truncate_str("hello world", 5), "hello");
    }

    #[test]
    fn zero_max() {
        assert_eq!(truncate_str("hello", 0), "");
    }

    #[test]
    fn multibyte_boundary_snaps_back() {
        // '—' (U+2014) is 3 bytes at positions 2..5
        let s = "ab—cd";
        assert_eq!(truncate_str(s, 3), "ab");
        assert_eq!(truncate_str(s, 4), "ab");
        assert_eq!(truncate_str(s, 5), "ab—");
    }

    #[test]
    fn emoji_4_byte() {
        let s = "hi🦀bye";
        assert_eq!(truncate_str(s, 3), "hi");
        assert_eq!(truncate_str(s, 6), "hi🦀");
    }

    #[test]
    fn marked_fits_unchanged() {
        assert_eq!(truncate_marked("short", 100, "... [truncated]"), "short");
    }

    #[test]
    fn marked_appends_suffix() {
        let out = truncate_marked("abcdefgh", 4, "...");
        assert_eq!(out, "abcd...");
    }
}

//! Slug validation predicates for segment identifiers.
//!
//! Slugs are trimmed, non-empty identifiers composed of lowercase ASCII
//! letters, digits, hyphens, and underscores.

/// Maximum slug length, in bytes (slugs are ASCII).
pub(crate) const SLUG_MAX_LEN: usize = 64;

/// Return `true` when `value` is a valid segment slug.
pub(crate) fn is_valid_slug(value: &str) -> bool {
    !value.is_empty() && value.len() <= SLUG_MAX_LEN && has_allowed_slug_chars(value)
}

fn has_allowed_slug_chars(value: &str) -> bool {
    value
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_')
}

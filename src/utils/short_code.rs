//! Short code shape validation.

/// Maximum accepted short code length.
pub const MAX_CODE_LENGTH: usize = 64;

/// Returns true if `code` could be a stored short code.
///
/// # Rules
///
/// - Length: 1-64 characters
/// - Allowed characters: ASCII letters, digits, `-` and `_`
///
/// Anything else is rejected before touching the link store.
///
/// # Examples
///
/// ```ignore
/// assert!(is_well_formed("abc123"));
/// assert!(is_well_formed("promo_2025-q1"));
/// assert!(!is_well_formed(""));
/// assert!(!is_well_formed("../etc"));
/// ```
pub fn is_well_formed(code: &str) -> bool {
    !code.is_empty()
        && code.len() <= MAX_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

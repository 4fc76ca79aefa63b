//! Filename sanitization for uploaded media
//!
//! Uploaded filenames are untrusted: they become object storage keys
//! and later reappear as artifact key prefixes. Sanitization strips
//! directory components (path traversal defense), drops characters
//! that do not survive transliteration to ASCII, and restricts the
//! remainder to a conservative storage-safe alphabet.

/// Maximum length of a sanitized storage key.
const MAX_KEY_LENGTH: usize = 100;

/// Reduce an untrusted filename to a safe storage key.
///
/// - Keeps only the final path segment (`/` and `\` both count as
///   separators).
/// - Drops non-ASCII characters.
/// - Replaces every character outside `[A-Za-z0-9._-]` with `_`.
/// - Truncates to 100 characters.
///
/// Total function: never fails. Input that is entirely path
/// separators or non-ASCII yields an empty string; callers must
/// handle that case.
pub fn sanitize(name: &str) -> String {
    let basename = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    basename
        .chars()
        .filter(char::is_ascii)
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .take(MAX_KEY_LENGTH)
        .collect()
}

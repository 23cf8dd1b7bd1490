//! Alias normalization and validation.
//!
//! Aliases are a secondary lookup key for addresses. Lookup is
//! case/format-insensitive, so every alias is normalized to a canonical
//! form before it is used as a key. Normalization is deterministic, total,
//! and idempotent; an empty or whitespace-only alias normalizes to the
//! empty string, which is never a valid lookup key.

use crate::constants::{MAX_ALIAS_LENGTH, MIN_ALIAS_LENGTH};
use crate::error::AliasError;

/// Normalize an alias to its canonical lookup form.
///
/// Strips leading whitespace and `@` markers, strips trailing whitespace,
/// and lowercases the rest. `normalize(normalize(x)) == normalize(x)` for
/// every input.
pub fn normalize(alias: &str) -> String {
    alias
        .trim_start_matches(|c: char| c.is_whitespace() || c == '@')
        .trim_end()
        .to_lowercase()
}

/// Check that a normalized alias is registrable.
///
/// Registration is stricter than lookup: the canonical form must be within
/// the protocol length bounds and limited to `a-z`, `0-9`, `-`, `_`, `.`.
pub fn validate(normalized: &str) -> Result<(), AliasError> {
    if normalized.is_empty() {
        return Err(AliasError::Empty);
    }
    if normalized.len() < MIN_ALIAS_LENGTH || normalized.len() > MAX_ALIAS_LENGTH {
        return Err(AliasError::TooLong {
            len: normalized.len(),
            max: MAX_ALIAS_LENGTH,
        });
    }
    for c in normalized.chars() {
        let ok = c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.');
        if !ok {
            return Err(AliasError::InvalidCharacter(c));
        }
    }
    Ok(())
}

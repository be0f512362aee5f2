//! Key normalization.

use crate::error::{CoreError, CoreResult};

/// Separator that starts every canonical key.
pub const PATH_SEPARATOR: char = '/';

/// Returns the canonical form of `key`: prefixed with `/`.
///
/// Idempotent. The empty string becomes `/`, which as a prefix matches
/// every key.
pub fn normalize_key(key: &str) -> String {
    if key.starts_with(PATH_SEPARATOR) {
        key.to_string()
    } else {
        let mut out = String::with_capacity(key.len() + 1);
        out.push(PATH_SEPARATOR);
        out.push_str(key);
        out
    }
}

/// Normalizes a key that is about to be written.
///
/// # Errors
///
/// Returns [`CoreError::InvalidKey`] for the empty key.
pub fn validate_key(key: &str) -> CoreResult<String> {
    if key.is_empty() {
        return Err(CoreError::InvalidKey);
    }
    Ok(normalize_key(key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn prepends_separator() {
        assert_eq!(normalize_key("speed"), "/speed");
        assert_eq!(normalize_key("/speed"), "/speed");
        assert_eq!(normalize_key("a/b"), "/a/b");
        assert_eq!(normalize_key(""), "/");
    }

    #[test]
    fn empty_key_rejected_for_writes() {
        assert_eq!(validate_key(""), Err(CoreError::InvalidKey));
        assert_eq!(validate_key("x").unwrap(), "/x");
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(key in ".{0,32}") {
            let once = normalize_key(&key);
            prop_assert!(once.starts_with('/'));
            prop_assert_eq!(normalize_key(&once), once.clone());
        }
    }
}

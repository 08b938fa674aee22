//! Identifier rules for collection and field names.
//!
//! Names end up inside cache key prefixes, Redis `SCAN` patterns, and SQL
//! identifiers, so they are restricted to a conservative character set.

use crate::error::ValidationError;

/// Maximum length of a collection name.
pub const MAX_COLLECTION_NAME_LEN: usize = 48;

/// Maximum length of a field name.
pub const MAX_FIELD_NAME_LEN: usize = 128;

fn is_identifier(name: &str, max_len: usize) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= max_len
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A collection name: ASCII letter or `_` first, then letters, digits, `_`.
pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    if is_identifier(name, MAX_COLLECTION_NAME_LEN) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCollectionName(name.to_owned()))
    }
}

/// A field name, with the same character rules as collection names.
pub fn validate_field_name(name: &str) -> Result<(), ValidationError> {
    if is_identifier(name, MAX_FIELD_NAME_LEN) {
        Ok(())
    } else {
        Err(ValidationError::InvalidFieldName(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_identifiers() {
        for name in ["companies", "_audit", "user_profiles2", "A"] {
            assert!(validate_collection_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_separators_and_globs() {
        for name in ["", "a:b", "a*", "a-b", "1abc", "white space", "x;drop"] {
            assert!(validate_collection_name(name).is_err(), "{name}");
            assert!(validate_field_name(name).is_err(), "{name}");
        }
    }

    #[test]
    fn enforces_length() {
        let long = "a".repeat(MAX_COLLECTION_NAME_LEN + 1);
        assert!(validate_collection_name(&long).is_err());
        assert!(validate_field_name(&long).is_ok());
    }
}

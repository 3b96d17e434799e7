use std::{borrow::Cow, sync::LazyLock};

use regex::Regex;
use validator::ValidationError;

/// Regex for validating URL-friendly slugs (lowercase alphanumeric with hyphens).
/// Examples: "acme", "org1", "test-org-123"
pub static SLUG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap());

/// Maximum length of an external group identifier.
const MAX_EXTERNAL_ID_LENGTH: usize = 512;

/// Validate an identifier handed to us by the identity provider.
///
/// Provider IDs are opaque, but they end up in URL paths of the provider API
/// and in our audit log, so blank or padded values are rejected.
pub fn validate_external_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("empty_external_id");
        err.message = Some(Cow::Borrowed(
            "External IDs cannot be empty or whitespace-only",
        ));
        return Err(err);
    }
    if id.trim() != id {
        let mut err = ValidationError::new("padded_external_id");
        err.message = Some(Cow::Borrowed(
            "External IDs cannot have leading or trailing whitespace",
        ));
        return Err(err);
    }
    if id.len() > MAX_EXTERNAL_ID_LENGTH {
        let mut err = ValidationError::new("external_id_too_long");
        err.message = Some(Cow::Owned(format!(
            "External IDs cannot exceed {} characters",
            MAX_EXTERNAL_ID_LENGTH
        )));
        return Err(err);
    }
    Ok(())
}

//! Version name validation.

use crate::error::{RefError, RefResult};

/// Validate a version (branch) name.
///
/// Names must be non-empty, contain no whitespace or control characters,
/// no `..`, and must not begin or end with `/`.
pub fn validate_version_name(name: &str) -> RefResult<()> {
    let reject = |reason: &str| {
        Err(RefError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        })
    };

    if name.is_empty() {
        return reject("empty name");
    }
    if name.contains("..") {
        return reject("contains `..`");
    }
    if name.starts_with('/') || name.ends_with('/') {
        return reject("leading or trailing `/`");
    }
    if name
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return reject("contains whitespace or control characters");
    }
    Ok(())
}

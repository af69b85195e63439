//! Name validation shared by the backend, the blob store and the server.
//!
//! Object and container names end up as single path segments on disk and
//! as the trailing segment of remote paths (`<container>/<object>`), so a
//! name must never contain a separator or resolve to a relative directory.

use crate::domain::errors::DomainError;

/// Validation result type
pub type ValidationResult<T> = Result<T, DomainError>;

/// Longest object or container name accepted.
pub const MAX_NAME_LENGTH: usize = 255;

/// Validate an object name (a filename or a blob reference).
pub fn validate_object_name(name: &str) -> ValidationResult<()> {
    validate_segment(name)
}

/// Validate a container name. Container names additionally may not start
/// with a dot so they never collide with backend bookkeeping directories.
pub fn validate_container_name(name: &str) -> ValidationResult<()> {
    validate_segment(name)?;
    if name.starts_with('.') {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_segment(name: &str) -> ValidationResult<()> {
    let invalid = name.is_empty()
        || name.len() > MAX_NAME_LENGTH
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);

    if invalid {
        return Err(DomainError::InvalidName(name.to_string()));
    }
    Ok(())
}

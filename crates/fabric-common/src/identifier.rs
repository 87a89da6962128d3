//! Identifier Validation
//!
//! Tenant identifiers and application names end up as keyspace names,
//! database names and message-bus headers, so the accepted charset is
//! the intersection of what all of those tolerate.

use crate::error::{ServiceError, ServiceResult};

/// Longest accepted identifier
pub const MAX_IDENTIFIER_LENGTH: usize = 32;

/// Validate a tenant identifier or application name.
///
/// Accepted: 1 to 32 characters from `[a-z0-9_-]`, not starting with
/// `_` or `-`.
pub fn validate_identifier(identifier: &str) -> ServiceResult<()> {
    if identifier.is_empty() {
        return Err(ServiceError::bad_request("identifier must not be empty"));
    }
    if identifier.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ServiceError::bad_request(format!(
            "identifier '{}' exceeds {} characters",
            identifier, MAX_IDENTIFIER_LENGTH
        )));
    }
    let mut chars = identifier.chars();
    let first = chars.next().unwrap_or('_');
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return Err(ServiceError::bad_request(format!(
            "identifier '{}' must start with a lowercase letter or digit",
            identifier
        )));
    }
    if !identifier
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        return Err(ServiceError::bad_request(format!(
            "identifier '{}' contains characters outside [a-z0-9_-]",
            identifier
        )));
    }
    Ok(())
}

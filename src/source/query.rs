//! SphinxQL query composition.
//!
//! SphinxQL has no parameter binding for identifiers, so index names are checked against a
//! strict allow-list before they are interpolated into query text.

use super::types::IdentifierError;

/// Query enumerating every index known to the server.
pub const LIST_INDEXES: &str = "SHOW TABLES";

/// Return the name unchanged when it only contains ASCII alphanumerics and underscores.
pub fn validate_index_name(name: &str) -> Result<&str, IdentifierError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_');
    if valid {
        Ok(name)
    } else {
        Err(IdentifierError(name.to_string()))
    }
}

/// Build the per-index status query for a validated index name.
pub fn index_status_query(name: &str) -> Result<String, IdentifierError> {
    let name = validate_index_name(name)?;
    Ok(format!("SHOW INDEX {name} STATUS"))
}

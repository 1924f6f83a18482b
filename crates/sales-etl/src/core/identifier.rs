//! Identifier checks and quoting for generated SQL.
//!
//! Table and column names are interpolated into DDL/DML text, never bound,
//! so each one is checked here and then wrapped in the dialect's quote
//! characters with any embedded quote doubled.

use crate::error::{EtlError, Result};

/// Longest accepted identifier, in bytes.
const MAX_IDENTIFIER_BYTES: usize = 128;

/// Reject names that cannot be quoted safely.
pub fn validate_identifier(name: &str) -> Result<()> {
    let problem = if name.is_empty() {
        Some("identifier is empty".to_string())
    } else if name.contains('\0') {
        Some(format!("identifier {:?} contains a null byte", name))
    } else if name.len() > MAX_IDENTIFIER_BYTES {
        Some(format!(
            "identifier is {} bytes, over the {} byte limit",
            name.len(),
            MAX_IDENTIFIER_BYTES
        ))
    } else {
        None
    };

    match problem {
        Some(message) => Err(EtlError::Config(message)),
        None => Ok(()),
    }
}

fn quote_with(name: &str, quote: char) -> Result<String> {
    validate_identifier(name)?;
    let doubled: String = [quote, quote].iter().collect();
    Ok(format!(
        "{q}{}{q}",
        name.replace(quote, &doubled),
        q = quote
    ))
}

/// `"name"` for PostgreSQL and SQLite.
pub fn quote_ansi(name: &str) -> Result<String> {
    quote_with(name, '"')
}

/// `` `name` `` for MySQL.
pub fn quote_mysql(name: &str) -> Result<String> {
    quote_with(name, '`')
}

//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use regex::{Captures, Regex};
use std::sync::LazyLock;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, DuckDB, Snowflake, Oracle
pub fn quote_double(ident: &str) -> String {
    quote_with(ident, "\"")
}

/// Quote identifier with backticks.
/// Used by: MySQL
pub fn quote_backtick(ident: &str) -> String {
    quote_with(ident, "`")
}

/// Quote identifier with square brackets.
/// Used by: T-SQL (SQL Server, Azure Synapse)
pub fn quote_bracket(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Quote identifier with an arbitrary quote string, as reported by a driver.
/// An empty quote leaves the identifier untouched.
pub fn quote_with(ident: &str, quote: &str) -> String {
    if quote.is_empty() {
        return ident.to_string();
    }
    let escaped = ident.replace(quote, &quote.repeat(2));
    format!("{quote}{escaped}{quote}")
}

// =============================================================================
// Constant Conversion
// =============================================================================

static FUNCTION_CALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(").unwrap());

static KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Convert literal/expression text for a database family.
///
/// A text that is a single keyword (optionally followed by `()`) is looked up
/// with `constant`; otherwise every function call has its name looked up
/// with `function`.
pub fn convert_constant<C, F>(text: &str, constant: C, function: F) -> String
where
    C: Fn(&str) -> Option<&'static str>,
    F: Fn(&str) -> Option<&'static str>,
{
    let trimmed = text.trim();
    let keyword = trimmed.trim_end_matches("()").trim_end();
    if KEYWORD.is_match(keyword) {
        if let Some(replacement) = constant(&keyword.to_uppercase()) {
            return replacement.to_string();
        }
    }

    FUNCTION_CALL
        .replace_all(trimmed, |caps: &Captures| match function(&caps[1]) {
            Some(name) => format!("{}(", name),
            None => caps[0].to_string(),
        })
        .into_owned()
}

// =============================================================================
// Constant Remapping
// =============================================================================

/// Remap keyword constants for T-SQL dialect.
pub fn remap_constant_tsql(keyword: &str) -> Option<&'static str> {
    match keyword {
        "CURRENT_TIMESTAMP" | "NOW" | "LOCALTIMESTAMP" => Some("GETDATE()"),
        "CURRENT_DATE" => Some("CAST(GETDATE() AS DATE)"),
        "CURRENT_TIME" => Some("CAST(GETDATE() AS TIME)"),
        "CURRENT_USER" | "USER" => Some("SUSER_SNAME()"),
        _ => None,
    }
}

/// Remap keyword constants for MySQL dialect.
pub fn remap_constant_mysql(keyword: &str) -> Option<&'static str> {
    match keyword {
        "CURRENT_TIMESTAMP" | "LOCALTIMESTAMP" => Some("NOW()"),
        "CURRENT_DATE" => Some("CURDATE()"),
        "CURRENT_TIME" => Some("CURTIME()"),
        _ => None,
    }
}

/// Remap keyword constants for Oracle dialect.
pub fn remap_constant_oracle(keyword: &str) -> Option<&'static str> {
    match keyword {
        "CURRENT_TIMESTAMP" | "NOW" | "GETDATE" => Some("SYSTIMESTAMP"),
        "CURRENT_DATE" | "CURDATE" => Some("SYSDATE"),
        "CURRENT_USER" => Some("USER"),
        _ => None,
    }
}

/// Remap keyword constants for ANSI-leaning dialects (Postgres, DuckDB,
/// Snowflake): vendor spellings fold back to the standard keyword.
pub fn remap_constant_ansi(keyword: &str) -> Option<&'static str> {
    match keyword {
        "NOW" | "GETDATE" | "SYSDATE" | "SYSTIMESTAMP" => Some("CURRENT_TIMESTAMP"),
        "CURDATE" => Some("CURRENT_DATE"),
        "CURTIME" => Some("CURRENT_TIME"),
        _ => None,
    }
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for Postgres dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" => Some("TO_CHAR"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        "FORMAT" => Some("TO_CHAR"),
        "NVL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for DuckDB dialect.
pub fn remap_function_duckdb(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "TO_CHAR" => Some("STRFTIME"),
        "DATE_FORMAT" => Some("STRFTIME"),
        "FORMAT" => Some("STRFTIME"),
        "NVL" => Some("COALESCE"),
        "IFNULL" => Some("COALESCE"),
        "ISNULL" => Some("COALESCE"),
        _ => None,
    }
}

/// Remap functions for MySQL dialect.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" => Some("DATE_FORMAT"),
        "TO_CHAR" => Some("DATE_FORMAT"),
        "NVL" => Some("IFNULL"),
        "ISNULL" => Some("IFNULL"),
        "SUBSTR" => Some("SUBSTRING"),
        _ => None,
    }
}

/// Remap functions for T-SQL dialect.
pub fn remap_function_tsql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" => Some("GETDATE"),
        "STRFTIME" => Some("FORMAT"),
        "TO_CHAR" => Some("FORMAT"),
        "DATE_FORMAT" => Some("FORMAT"),
        "NVL" => Some("ISNULL"),
        "IFNULL" => Some("ISNULL"),
        _ => None,
    }
}

/// Remap functions for Snowflake dialect.
pub fn remap_function_snowflake(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "STRFTIME" => Some("TO_CHAR"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        "IFNULL" => Some("NVL"),
        "ISNULL" => Some("NVL"),
        _ => None,
    }
}

/// Remap functions for Oracle dialect.
pub fn remap_function_oracle(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "IFNULL" => Some("NVL"),
        "ISNULL" => Some("NVL"),
        "SUBSTRING" => Some("SUBSTR"),
        "STRFTIME" => Some("TO_CHAR"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        "LEN" => Some("LENGTH"),
        _ => None,
    }
}

//! Snowflake SQL dialect.
//!
//! Snowflake features:
//! - ANSI identifier quoting (`"`)
//! - Uppercase case folding for unquoted identifiers
//! - `NVL` alongside `COALESCE`

use super::helpers;
use super::SqlDialect;

/// Snowflake SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        helpers::remap_constant_ansi(keyword)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_snowflake(name)
    }
}

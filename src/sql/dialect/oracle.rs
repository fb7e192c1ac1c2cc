//! Oracle SQL dialect.
//!
//! Oracle differences from ANSI:
//! - ANSI identifier quoting (`"`)
//! - `SYSTIMESTAMP`/`SYSDATE` for the current time
//! - `NVL`, `SUBSTR` and `LENGTH` spellings

use super::helpers;
use super::SqlDialect;

/// Oracle SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl SqlDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        helpers::remap_constant_oracle(keyword)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_oracle(name)
    }
}

//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - `CURDATE()`/`CURTIME()`/`NOW()` for current date and time
//! - `IFNULL` rather than `NVL`
//! - No FULL OUTER JOIN

use super::helpers;
use super::SqlDialect;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn identifier_quote(&self) -> &'static str {
        "`"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        helpers::remap_constant_mysql(keyword)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn supports_full_outer_join(&self) -> bool {
        false
    }
}

//! DuckDB SQL dialect.
//!
//! DuckDB is largely Postgres-compatible:
//! - ANSI identifier quoting (`"`)
//! - `STRFTIME` for date formatting

use super::helpers;
use super::SqlDialect;

/// DuckDB SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        helpers::remap_constant_ansi(keyword)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_duckdb(name)
    }
}

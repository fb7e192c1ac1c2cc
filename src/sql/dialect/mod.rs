//! Database families and their formatting rules.
//!
//! Each family implements `SqlDialect` to describe the parts of generated
//! SQL that differ between databases:
//!
//! - Identifier quoting: `"` (ANSI/PG/DuckDB/Oracle/Snowflake), `` ` `` (MySQL), `[]` (T-SQL)
//! - Literal constants: `CURRENT_TIMESTAMP` vs `GETDATE()` vs `SYSTIMESTAMP`
//! - Function names inside expressions: `IFNULL` vs `ISNULL` vs `NVL`
//!
//! # Usage
//!
//! ```ignore
//! use joinery::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::TSql;
//! assert_eq!(dialect.convert_constant("CURRENT_TIMESTAMP"), "GETDATE()");
//! ```

mod duckdb;
pub mod helpers;
mod mysql;
mod oracle;
mod postgres;
mod snowflake;
mod tsql;

pub use duckdb::DuckDb;
pub use mysql::MySql;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use snowflake::Snowflake;
pub use tsql::TSql;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// SQL dialect trait - defines how family-specific constructs are rendered.
///
/// The default implementations follow ANSI SQL where possible.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier Quoting
    // =========================================================================

    /// The quote string a driver for this family reports.
    fn identifier_quote(&self) -> &'static str {
        "\""
    }

    /// Quote an identifier (table, column).
    ///
    /// - ANSI/PostgreSQL/DuckDB: `"identifier"`
    /// - MySQL: `` `identifier` ``
    /// - T-SQL: `[identifier]`
    fn quote_identifier(&self, ident: &str) -> String;

    // =========================================================================
    // Constants and functions
    // =========================================================================

    /// Replacement for a whole-text keyword constant such as
    /// `CURRENT_TIMESTAMP`. The input is upper-case without trailing `()`.
    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        let _ = keyword;
        None
    }

    /// Remap a function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to
    /// keep the original. Matched case-insensitively.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    /// Text to emit for a literal/expression item.
    fn convert_constant(&self, text: &str) -> String {
        helpers::convert_constant(
            text,
            |keyword| self.remap_constant(keyword),
            |name| self.remap_function(name),
        )
    }

    // =========================================================================
    // JOIN Syntax
    // =========================================================================

    /// Whether this dialect supports FULL OUTER JOIN.
    fn supports_full_outer_join(&self) -> bool {
        true
    }
}

/// Supported database families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    MySql,
    TSql,
    DuckDb,
    Snowflake,
    Oracle,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Postgres,
        Dialect::MySql,
        Dialect::TSql,
        Dialect::DuckDb,
        Dialect::Snowflake,
        Dialect::Oracle,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::MySql => &MySql,
            Dialect::TSql => &TSql,
            Dialect::DuckDb => &DuckDb,
            Dialect::Snowflake => &Snowflake,
            Dialect::Oracle => &Oracle,
        }
    }

    /// Map a connection driver name to its family.
    pub fn from_driver(driver: &str) -> Option<Dialect> {
        driver.parse().ok()
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "tsql" | "mssql" | "sqlserver" | "sql_server" => Ok(Dialect::TSql),
            "duckdb" | "duck" => Ok(Dialect::DuckDb),
            "snowflake" => Ok(Dialect::Snowflake),
            "oracle" => Ok(Dialect::Oracle),
            other => Err(format!("unsupported dialect: {}", other)),
        }
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn identifier_quote(&self) -> &'static str {
        self.dialect().identifier_quote()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn remap_constant(&self, keyword: &str) -> Option<&'static str> {
        self.dialect().remap_constant(keyword)
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn convert_constant(&self, text: &str) -> String {
        self.dialect().convert_constant(text)
    }

    fn supports_full_outer_join(&self) -> bool {
        self.dialect().supports_full_outer_join()
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dialect().name())
    }
}

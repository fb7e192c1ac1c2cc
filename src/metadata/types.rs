//! Metadata types for the provider abstraction.

use serde::{Deserialize, Serialize};

use crate::model::{ColumnRef, TableRef};
use crate::sql::Dialect;

/// A configured database the query is written against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSource {
    /// Connection name from the settings file.
    pub name: String,
    /// Database driver (postgres, mssql, duckdb, ...).
    pub driver: String,
    /// Driver-specific connection string, env vars already expanded.
    pub connection_string: String,
    /// Default schema for unqualified tables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_schema: Option<String>,
}

impl DataSource {
    /// Database family of the driver, when it is one we generate for.
    pub fn dialect(&self) -> Option<Dialect> {
        Dialect::from_driver(&self.driver)
    }
}

/// Information about a table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Ordinal position (1-based).
    pub position: i32,
    /// Database-specific type name.
    pub data_type: String,
    /// Whether NULL values are allowed.
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, position: i32, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position,
            data_type: data_type.into(),
            nullable: true,
        }
    }

    pub fn to_column_ref(&self) -> ColumnRef {
        ColumnRef::new(self.name.clone()).with_type(self.data_type.clone())
    }
}

/// Column metadata for one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMetadata {
    pub table: TableRef,
    pub columns: Vec<ColumnInfo>,
}

impl TableMetadata {
    pub fn new(table: TableRef, columns: Vec<ColumnInfo>) -> Self {
        Self { table, columns }
    }

    /// Whether this entry answers a lookup for `wanted`.
    ///
    /// Catalog and schema only constrain the match when `wanted` names them.
    pub fn matches(&self, wanted: &TableRef) -> bool {
        fn part_matches(have: &Option<String>, want: &Option<String>) -> bool {
            match want {
                Some(want) => have.as_deref().is_some_and(|h| h.eq_ignore_ascii_case(want)),
                None => true,
            }
        }

        self.table.name.eq_ignore_ascii_case(&wanted.name)
            && part_matches(&self.table.schema, &wanted.schema)
            && part_matches(&self.table.catalog, &wanted.catalog)
    }
}

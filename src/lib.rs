//! # Joinery
//!
//! A mutable model of a SQL SELECT statement built from a graph of tables,
//! columns and joins.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Editor / persistence replay (callers)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │ mutations
//!                          ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │   Query: containers, items, joins, ordinal spaces        │──► QueryEvent listeners
//! └─────────────────────────────────────────────────────────┘
//!                          │ generate_query()
//!                          ▼ [join graph + depth-first linearizer]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SELECT / FROM / JOIN ... ON / WHERE / GROUP BY /       │
//! │   HAVING / ORDER BY text for the database family         │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod model;
pub mod query;
pub mod sql;

pub use sql::dialect;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::dialect::{Dialect, SqlDialect};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::metadata::{DataSource, InMemoryMetadata, MetadataProvider};
    pub use crate::model::{
        Comparator, Container, ContainerId, GroupFunction, Item, ItemId, ItemSource, Join, JoinId,
        JoinKind, SortDirection, TableRef,
    };
    pub use crate::query::{Query, QueryDocument, QueryEvent};
    pub use crate::sql::{ConstantConverter, DialectConverter};
}

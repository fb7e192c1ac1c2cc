//! Database metadata boundary.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     MetadataProvider                      │
//! │   open(data_source) ──► MetadataConnection                │
//! │                          - identifier_quote()             │
//! │                          - table(catalog.schema.name)     │
//! └──────────────────────────────────────────────────────────┘
//!                            │  best-effort: failures degrade
//!                            ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │   Query: quote string at generation, columns on attach    │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod memory;
mod provider;
mod types;

pub use memory::InMemoryMetadata;
pub use provider::{
    resolve_identifier_quote, resolve_table, MetadataConnection, MetadataError, MetadataProvider,
    MetadataResult,
};
pub use types::*;

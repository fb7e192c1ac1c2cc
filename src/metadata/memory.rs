//! In-memory metadata provider backed by a fixed catalog.

use super::provider::{MetadataConnection, MetadataProvider, MetadataResult};
use super::types::{DataSource, TableMetadata};
use crate::model::TableRef;

/// Metadata from a fixed catalog; works with or without a data source.
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadata {
    quote: String,
    tables: Vec<TableMetadata>,
}

impl InMemoryMetadata {
    pub fn new(quote: impl Into<String>) -> Self {
        Self {
            quote: quote.into(),
            tables: Vec::new(),
        }
    }

    pub fn with_table(mut self, table: TableMetadata) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(&self) -> &[TableMetadata] {
        &self.tables
    }
}

impl MetadataProvider for InMemoryMetadata {
    fn open(&self, _source: Option<&DataSource>) -> MetadataResult<Box<dyn MetadataConnection + '_>> {
        Ok(Box::new(InMemoryConnection { catalog: self }))
    }
}

struct InMemoryConnection<'a> {
    catalog: &'a InMemoryMetadata,
}

impl MetadataConnection for InMemoryConnection<'_> {
    fn identifier_quote(&self) -> MetadataResult<String> {
        Ok(self.catalog.quote.clone())
    }

    fn table(&self, table: &TableRef) -> MetadataResult<Option<TableMetadata>> {
        Ok(self
            .catalog
            .tables
            .iter()
            .find(|t| t.matches(table))
            .cloned())
    }
}

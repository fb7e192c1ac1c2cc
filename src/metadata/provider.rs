//! MetadataProvider trait definition.
//!
//! The provider abstracts over ways of reaching a live database. The query
//! uses it for two things only: the identifier quote string at generation
//! time, and column lists when a table is attached. Both are best-effort.

use thiserror::Error;
use tracing::{debug, warn};

use super::types::{DataSource, TableMetadata};
use crate::model::TableRef;

/// Result type for metadata operations.
pub type MetadataResult<T> = Result<T, MetadataError>;

/// Errors raised while talking to a database for metadata.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetadataError {
    /// The query has no data source configured.
    #[error("no data source configured")]
    NoDataSource,

    /// The database could not be reached.
    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    /// A metadata lookup failed on an open connection.
    #[error("metadata lookup failed: {0}")]
    Lookup(String),
}

/// Opens live metadata handles for a data source.
///
/// # Example
///
/// ```ignore
/// use joinery::metadata::{MetadataProvider, InMemoryMetadata};
///
/// let provider = InMemoryMetadata::new("\"");
/// let conn = provider.open(None)?;
/// assert_eq!(conn.identifier_quote()?, "\"");
/// ```
pub trait MetadataProvider: Send + Sync {
    /// Open a handle. `source` is `None` when the query has no data source;
    /// providers that need one return [`MetadataError::NoDataSource`].
    fn open(&self, source: Option<&DataSource>) -> MetadataResult<Box<dyn MetadataConnection + '_>>;
}

/// A live metadata handle.
pub trait MetadataConnection {
    /// The database's identifier quote string (e.g. `"`).
    fn identifier_quote(&self) -> MetadataResult<String>;

    /// Column metadata for a table, or `None` when it does not exist.
    fn table(&self, table: &TableRef) -> MetadataResult<Option<TableMetadata>>;
}

/// Fetch the identifier quote string, degrading to an empty string.
///
/// A quote of a single space means "quoting not supported" and is treated
/// as empty.
pub fn resolve_identifier_quote(
    provider: &dyn MetadataProvider,
    source: Option<&DataSource>,
) -> String {
    let quote = provider
        .open(source)
        .and_then(|conn| conn.identifier_quote());

    match quote {
        Ok(quote) if quote.trim().is_empty() => String::new(),
        Ok(quote) => quote,
        Err(MetadataError::NoDataSource) => {
            debug!("no data source, generating unquoted identifiers");
            String::new()
        }
        Err(e) => {
            warn!(error = %e, "identifier quote unavailable, generating unquoted identifiers");
            String::new()
        }
    }
}

/// Look up a table, treating every failure as "not found".
pub fn resolve_table(
    provider: &dyn MetadataProvider,
    source: Option<&DataSource>,
    table: &TableRef,
) -> Option<TableMetadata> {
    let found = provider.open(source).and_then(|conn| conn.table(table));

    match found {
        Ok(Some(metadata)) => Some(metadata),
        Ok(None) => {
            warn!(table = %table, "table not found in database");
            None
        }
        Err(e) => {
            warn!(table = %table, error = %e, "table metadata unavailable");
            None
        }
    }
}

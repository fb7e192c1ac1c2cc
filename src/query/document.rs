//! Flattened, serializable form of a query.
//!
//! A [`QueryDocument`] carries every container, item and join with their
//! ids, plus the query-level settings. Replaying a document goes through
//! the normal mutation operations, so a document that breaks a model
//! invariant (two items on one ordinal, a join to a missing table) is
//! rejected with the corresponding [`QueryError`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::Query;
use crate::config::QuerySettings;
use crate::error::QueryError;
use crate::model::{Container, Join};
use crate::sql::Dialect;

/// Errors while reading or replaying a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid query document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("document does not describe a valid query: {0}")]
    Query(#[from] QueryError),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Saved query state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDocument {
    /// Database family; the settings' dialect applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<Dialect>,
    /// Dialect identifier quoting; the settings' flag applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote_identifiers: Option<bool>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub filter: String,
    #[serde(default)]
    pub grouping: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub streaming_row_limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_sql: Option<String>,
    /// From-containers in FROM order.
    #[serde(default)]
    pub containers: Vec<Container>,
    /// The constants pseudo-table; a fresh one is created when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constants: Option<Container>,
    #[serde(default)]
    pub joins: Vec<Join>,
}

impl QueryDocument {
    pub fn from_json(json: &str) -> DocumentResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a document from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> DocumentResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| DocumentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}

impl Query {
    /// Flatten the query into a document.
    pub fn to_document(&self) -> QueryDocument {
        QueryDocument {
            dialect: Some(self.dialect),
            quote_identifiers: Some(self.quote_identifiers),
            filter: self.filter.clone(),
            grouping: self.grouping,
            row_limit: self.row_limit,
            streaming_row_limit: self.streaming_row_limit,
            user_sql: self.user_sql.clone(),
            containers: self.from.iter().map(Container::create_copy).collect(),
            constants: Some(self.constants.create_copy()),
            joins: self.joins.clone(),
        }
    }

    /// Rebuild a query from a document with default settings.
    pub fn from_document(document: QueryDocument) -> DocumentResult<Query> {
        Self::from_document_with(document, &QuerySettings::default())
    }

    /// Rebuild a query from a document. `settings` supplies what the
    /// document does not carry (dialect, identifier quoting, the constants
    /// name when the document has no constants container).
    pub fn from_document_with(document: QueryDocument, settings: &QuerySettings) -> DocumentResult<Query> {
        let mut query = match document.constants {
            Some(constants) if !constants.is_constants() => {
                return Err(QueryError::ConstantsContainer.into());
            }
            Some(constants) => {
                let mut query = Query::with_constants(settings, constants.create_copy());
                query.constants.drain_items();
                for item in constants.items() {
                    query.add_constant(item.create_copy(), None)?;
                }
                query
            }
            None => Query::with_settings(settings),
        };

        query.dialect = document.dialect.unwrap_or(settings.dialect);
        query.quote_identifiers = document.quote_identifiers.unwrap_or(settings.quote_identifiers);
        query.filter = document.filter;
        query.grouping = document.grouping;
        query.row_limit = document.row_limit;
        query.streaming_row_limit = document.streaming_row_limit;
        query.user_sql = document.user_sql;

        for container in document.containers {
            query.add_table(container, None)?;
        }
        for join in document.joins {
            query.add_join(join)?;
        }
        Ok(query)
    }
}

//! Error types for model and query mutation.
//!
//! Every variant here is a programming error: correct callers never trigger
//! them. They are returned rather than panicked so that an editor driving the
//! model can surface them and keep running.

use thiserror::Error;

use crate::model::{ContainerId, ItemId, JoinId};
use crate::query::OrdinalKind;

/// Result type for model and query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised by invalid model or query mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The container is already part of the query.
    #[error("container {0} is already part of the query")]
    DuplicateContainer(ContainerId),

    /// The container is not part of the query.
    #[error("container {0} is not part of the query")]
    UnknownContainer(ContainerId),

    /// An item with this id already exists in the query.
    #[error("item {0} already exists in the query")]
    DuplicateItem(ItemId),

    /// The item is not part of the query (or container).
    #[error("item {0} is not part of the query")]
    UnknownItem(ItemId),

    /// The join is not part of the query.
    #[error("join {0} is not part of the query")]
    UnknownJoin(JoinId),

    /// An equal join already exists.
    #[error("an equal join already exists: {0}")]
    DuplicateJoin(JoinId),

    /// A join endpoint does not resolve inside the query.
    #[error("join {join} references container {container} which is not part of the query")]
    DanglingJoin {
        join: JoinId,
        container: ContainerId,
    },

    /// Both endpoints of a join are in the same container.
    #[error("cannot join two items of container {0}")]
    SameContainerJoin(ContainerId),

    /// The item has not been added to a container yet.
    #[error("item {0} does not belong to a container")]
    DetachedItem(ItemId),

    /// Two different items would hold the same ordinal.
    #[error("{space} ordinal {ordinal} is held by item {holder}, cannot assign it to item {item}")]
    DuplicateOrdinal {
        space: OrdinalKind,
        ordinal: usize,
        holder: ItemId,
        item: ItemId,
    },

    /// The item is part of the query but holds no ordinal in this space.
    #[error("item {item} has no {space} ordinal")]
    NotOrdered { space: OrdinalKind, item: ItemId },

    /// Items of a table-backed container are derived from the schema.
    #[error("container {0} is backed by a table; its items cannot be edited")]
    SchemaBacked(ContainerId),

    /// The constants pseudo-table was used where a table is required.
    #[error("the constants container cannot be used as a table")]
    ConstantsContainer,

    /// Positional insert/remove outside the current bounds.
    #[error("index {index} is out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// `end_compound_edit` without a matching start.
    #[error("end_compound_edit called without a matching start_compound_edit")]
    UnbalancedCompoundEdit,
}

//! The query aggregate root.
//!
//! A [`Query`] owns the from-containers, the constants container, the joins
//! and every derived index:
//!
//! - `join_index`: container id → incident join ids (both endpoints)
//! - `owners`: item id → owning container id
//! - two [`OrdinalSpace`]s for the SELECT list and ORDER BY positions
//!
//! All mutation goes through `Query` so the indices, the ordinals stored on
//! items and the emitted [`QueryEvent`]s stay consistent. SQL text is
//! produced on demand by [`Query::generate_query`].
//!
//! # Example
//!
//! ```ignore
//! use joinery::prelude::*;
//!
//! let mut query = Query::new();
//! let orders = query.add_table(Container::table(TableRef::new("Orders"), ["id", "customer_id"]), None)?;
//! let customers = query.add_table(Container::table(TableRef::new("Customers"), ["id", "name"]), None)?;
//! ```

pub mod document;
pub mod events;
mod generate;
mod mutation;
pub mod ordinals;

pub use document::{DocumentError, QueryDocument};
pub use events::{EventBus, ItemProperty, JoinProperty, ListenerId, QueryEvent, QueryProperty};
pub use ordinals::{OrdinalChange, OrdinalKind, OrdinalSpace};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::config::QuerySettings;
use crate::error::{QueryError, QueryResult};
use crate::metadata::{DataSource, MetadataProvider};
use crate::model::{Container, ContainerId, Item, ItemId, Join, JoinId};
use crate::sql::{ConstantConverter, Dialect, DialectConverter};

/// Display name of the constants pseudo-table when none is configured.
pub const DEFAULT_CONSTANTS_NAME: &str = "Constants";

/// A mutable SELECT statement built from containers, items and joins.
pub struct Query {
    from: Vec<Container>,
    constants: Container,
    joins: Vec<Join>,
    join_index: HashMap<ContainerId, Vec<JoinId>>,
    owners: HashMap<ItemId, ContainerId>,
    selection: OrdinalSpace,
    ordering: OrdinalSpace,

    filter: String,
    grouping: bool,
    row_limit: Option<u64>,
    streaming_row_limit: Option<u64>,
    user_sql: Option<String>,

    dialect: Dialect,
    quote_identifiers: bool,
    data_source: Option<DataSource>,
    metadata: Option<Arc<dyn MetadataProvider>>,
    /// Quote string reported by the provider, fetched on first generation.
    provider_quote: Mutex<Option<String>>,
    converter: Arc<dyn ConstantConverter>,

    events: EventBus,
    compound_depth: usize,
}

impl Default for Query {
    fn default() -> Self {
        Self::new()
    }
}

impl Query {
    pub fn new() -> Self {
        Self::with_settings(&QuerySettings::default())
    }

    /// A query using the `[query]` section of the settings file.
    pub fn with_settings(settings: &QuerySettings) -> Self {
        Self::with_constants(settings, Container::constants(settings.constants_name.clone()))
    }

    fn with_constants(settings: &QuerySettings, constants: Container) -> Self {
        Self {
            from: Vec::new(),
            constants,
            joins: Vec::new(),
            join_index: HashMap::new(),
            owners: HashMap::new(),
            selection: OrdinalSpace::new(OrdinalKind::Selection),
            ordering: OrdinalSpace::new(OrdinalKind::OrderBy),
            filter: String::new(),
            grouping: false,
            row_limit: settings.row_limit,
            streaming_row_limit: settings.streaming_row_limit,
            user_sql: None,
            dialect: settings.dialect,
            quote_identifiers: settings.quote_identifiers,
            data_source: None,
            metadata: None,
            provider_quote: Mutex::new(None),
            converter: Arc::new(DialectConverter),
            events: EventBus::new(),
            compound_depth: 0,
        }
    }

    pub fn with_metadata(mut self, provider: Arc<dyn MetadataProvider>) -> Self {
        self.metadata = Some(provider);
        self.provider_quote.get_mut().take();
        self
    }

    pub fn with_data_source(mut self, source: DataSource) -> Self {
        self.data_source = Some(source);
        self.provider_quote.get_mut().take();
        self
    }

    pub fn with_converter(mut self, converter: Arc<dyn ConstantConverter>) -> Self {
        self.converter = converter;
        self
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// From-containers in FROM order (constants excluded).
    pub fn containers(&self) -> &[Container] {
        &self.from
    }

    pub fn constants(&self) -> &Container {
        &self.constants
    }

    /// Joins in insertion order.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// A from-container or the constants container.
    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        if self.constants.id() == id {
            return Some(&self.constants);
        }
        self.from.iter().find(|c| c.id() == id)
    }

    pub fn container_index(&self, id: ContainerId) -> Option<usize> {
        self.from.iter().position(|c| c.id() == id)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        let owner = self.owners.get(&id)?;
        self.container(*owner)?.item(id)
    }

    /// The container an item belongs to.
    pub fn owner_of(&self, item: ItemId) -> Option<&Container> {
        self.container(*self.owners.get(&item)?)
    }

    pub fn join(&self, id: JoinId) -> Option<&Join> {
        self.joins.iter().find(|j| j.id() == id)
    }

    /// Ids of the joins touching `container`, in insertion order.
    pub fn joins_for(&self, container: ContainerId) -> &[JoinId] {
        self.join_index
            .get(&container)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Selected items in SELECT order.
    pub fn selected_items(&self) -> Vec<&Item> {
        self.selection.items().filter_map(|id| self.item(id)).collect()
    }

    /// Ordered items in ORDER BY order.
    pub fn order_by_items(&self) -> Vec<&Item> {
        self.ordering.items().filter_map(|id| self.item(id)).collect()
    }

    pub fn selection(&self) -> &OrdinalSpace {
        &self.selection
    }

    pub fn ordering(&self) -> &OrdinalSpace {
        &self.ordering
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn is_grouping(&self) -> bool {
        self.grouping
    }

    pub fn row_limit(&self) -> Option<u64> {
        self.row_limit
    }

    pub fn streaming_row_limit(&self) -> Option<u64> {
        self.streaming_row_limit
    }

    pub fn user_sql(&self) -> Option<&str> {
        self.user_sql.as_deref()
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn quote_identifiers(&self) -> bool {
        self.quote_identifiers
    }

    pub fn data_source(&self) -> Option<&DataSource> {
        self.data_source.as_ref()
    }

    pub fn compound_depth(&self) -> usize {
        self.compound_depth
    }

    // =========================================================================
    // Listeners
    // =========================================================================

    pub fn subscribe<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&QueryEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&self, event: QueryEvent) {
        self.events.emit(event);
    }

    fn emit_property(&self, property: QueryProperty) {
        self.emit(QueryEvent::PropertyChanged { property });
    }

    // =========================================================================
    // Compound edits
    // =========================================================================

    /// Open a compound edit. Only the outermost start is reported.
    pub fn start_compound_edit(&mut self, message: impl Into<String>) {
        self.compound_depth += 1;
        if self.compound_depth == 1 {
            let message = message.into();
            debug!(%message, "compound edit started");
            self.emit(QueryEvent::CompoundEditStarted { message });
        }
    }

    /// Close a compound edit. Only the outermost end is reported.
    pub fn end_compound_edit(&mut self) -> QueryResult<()> {
        if self.compound_depth == 0 {
            return Err(QueryError::UnbalancedCompoundEdit);
        }
        self.compound_depth -= 1;
        if self.compound_depth == 0 {
            debug!("compound edit ended");
            self.emit(QueryEvent::CompoundEditEnded);
        }
        Ok(())
    }

    /// Run `edit` inside a compound edit. The edit is always closed, also
    /// when `edit` returns an error; state changes are not rolled back.
    pub fn compound_edit<R>(
        &mut self,
        message: impl Into<String>,
        edit: impl FnOnce(&mut Self) -> R,
    ) -> R {
        let depth = self.compound_depth;
        self.start_compound_edit(message);
        let result = edit(self);
        while self.compound_depth > depth {
            if self.end_compound_edit().is_err() {
                break;
            }
        }
        if self.compound_depth < depth {
            warn!(
                expected = depth,
                actual = self.compound_depth,
                "compound edit closed more often than opened"
            );
        }
        result
    }

    // =========================================================================
    // Query properties
    // =========================================================================

    /// Global filter text, appended verbatim to WHERE.
    pub fn set_filter(&mut self, filter: impl Into<String>) {
        let filter = filter.into();
        if self.filter != filter {
            self.filter = filter;
            self.emit_property(QueryProperty::Filter);
        }
    }

    pub fn set_grouping(&mut self, grouping: bool) {
        if self.grouping != grouping {
            self.grouping = grouping;
            self.emit_property(QueryProperty::Grouping);
        }
    }

    pub fn set_row_limit(&mut self, limit: Option<u64>) {
        if self.row_limit != limit {
            self.row_limit = limit;
            self.emit_property(QueryProperty::RowLimit);
        }
    }

    pub fn set_streaming_row_limit(&mut self, limit: Option<u64>) {
        if self.streaming_row_limit != limit {
            self.streaming_row_limit = limit;
            self.emit_property(QueryProperty::StreamingRowLimit);
        }
    }

    /// Override the generated SQL with hand-written text; `None` resets.
    pub fn set_user_sql(&mut self, sql: Option<String>) {
        if self.user_sql != sql {
            self.user_sql = sql;
            self.emit_property(QueryProperty::UserSql);
        }
    }

    pub fn set_dialect(&mut self, dialect: Dialect) {
        if self.dialect != dialect {
            self.dialect = dialect;
            self.emit_property(QueryProperty::Dialect);
        }
    }

    pub fn set_quote_identifiers(&mut self, quote: bool) {
        if self.quote_identifiers != quote {
            self.quote_identifiers = quote;
            self.emit_property(QueryProperty::QuoteIdentifiers);
        }
    }

    /// Point the query at a database. The dialect follows the driver when
    /// the driver names a known family.
    pub fn set_data_source(&mut self, source: Option<DataSource>) {
        if self.data_source == source {
            return;
        }
        if let Some(dialect) = source.as_ref().and_then(DataSource::dialect) {
            self.set_dialect(dialect);
        }
        self.data_source = source;
        self.provider_quote.get_mut().take();
        self.emit_property(QueryProperty::DataSource);
    }

    pub fn set_metadata_provider(&mut self, provider: Option<Arc<dyn MetadataProvider>>) {
        self.metadata = provider;
        self.provider_quote.get_mut().take();
    }

    pub fn set_converter(&mut self, converter: Arc<dyn ConstantConverter>) {
        self.converter = converter;
    }

    // =========================================================================
    // Copy
    // =========================================================================

    /// A structurally identical, independently mutable query.
    ///
    /// Container, item and join ids are preserved. The copy starts with no
    /// listeners and no open compound edit.
    pub fn create_copy(&self) -> QueryResult<Query> {
        let mut copy = Self {
            from: self.from.iter().map(Container::create_copy).collect(),
            constants: self.constants.create_copy(),
            joins: Vec::with_capacity(self.joins.len()),
            join_index: HashMap::new(),
            owners: self.owners.clone(),
            selection: self.selection.clone(),
            ordering: self.ordering.clone(),
            filter: self.filter.clone(),
            grouping: self.grouping,
            row_limit: self.row_limit,
            streaming_row_limit: self.streaming_row_limit,
            user_sql: self.user_sql.clone(),
            dialect: self.dialect,
            quote_identifiers: self.quote_identifiers,
            data_source: self.data_source.clone(),
            metadata: self.metadata.clone(),
            provider_quote: Mutex::new(self.provider_quote.lock().clone()),
            converter: Arc::clone(&self.converter),
            events: EventBus::new(),
            compound_depth: 0,
        };

        for join in &self.joins {
            let left = copy
                .item(join.left().item)
                .ok_or(QueryError::UnknownItem(join.left().item))?;
            let right = copy
                .item(join.right().item)
                .ok_or(QueryError::UnknownItem(join.right().item))?;
            let join = join.create_copy(left, right)?;
            copy.index_join(&join);
            copy.joins.push(join);
        }

        Ok(copy)
    }

    fn index_join(&mut self, join: &Join) {
        for container in [join.left().container, join.right().container] {
            self.join_index.entry(container).or_default().push(join.id());
        }
    }

    fn unindex_join(&mut self, join: &Join) {
        for container in [join.left().container, join.right().container] {
            if let Some(ids) = self.join_index.get_mut(&container) {
                ids.retain(|id| *id != join.id());
                if ids.is_empty() {
                    self.join_index.remove(&container);
                }
            }
        }
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("from", &self.from)
            .field("constants", &self.constants)
            .field("joins", &self.joins)
            .field("filter", &self.filter)
            .field("grouping", &self.grouping)
            .field("row_limit", &self.row_limit)
            .field("streaming_row_limit", &self.streaming_row_limit)
            .field("user_sql", &self.user_sql)
            .field("dialect", &self.dialect)
            .field("quote_identifiers", &self.quote_identifiers)
            .field("data_source", &self.data_source)
            .field("has_metadata", &self.metadata.is_some())
            .field("events", &self.events)
            .field("compound_depth", &self.compound_depth)
            .finish()
    }
}

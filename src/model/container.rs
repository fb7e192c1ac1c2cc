//! Containers: ordered, named collections of items.
//!
//! A container is either a database table (its items are derived from the
//! table's columns and cannot be edited afterwards) or the constants
//! pseudo-table holding literal expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{ContainerId, ItemId};
use super::item::{Item, ItemSource};
use crate::error::{QueryError, QueryResult};
use crate::metadata::TableMetadata;

// =============================================================================
// Table Reference
// =============================================================================

/// A table reference with optional catalog and schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: &str) -> Self {
        Self {
            catalog: None,
            schema: None,
            name: name.into(),
        }
    }

    pub fn with_schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_catalog(mut self, catalog: &str) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Non-empty name parts, outermost first.
    pub fn parts(&self) -> impl Iterator<Item = &str> {
        [self.catalog.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.parts().collect();
        write!(f, "{}", parts.join("."))
    }
}

// =============================================================================
// Container
// =============================================================================

/// Canvas position. Carried through untouched by the core.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// What a container stands for in the FROM clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContainerKind {
    /// A database table; items mirror its columns.
    Table { table: TableRef },
    /// The constants pseudo-table; never part of FROM.
    Constants,
}

/// An ordered, named collection of items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    id: ContainerId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    alias: Option<String>,
    #[serde(default)]
    position: Position,
    #[serde(flatten)]
    kind: ContainerKind,
    #[serde(default)]
    items: Vec<Item>,
}

impl Container {
    /// A table-backed container with one column item per column, in order.
    pub fn table<I, S>(table: TableRef, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut container = Self::empty(table.name.clone(), ContainerKind::Table { table });
        for column in columns {
            container.push_item(Item::column(column));
        }
        container
    }

    /// A table-backed container materialized from column metadata.
    pub fn from_metadata(metadata: &TableMetadata) -> Self {
        let mut columns = metadata.columns.clone();
        columns.sort_by_key(|c| c.position);

        let mut container = Self::empty(
            metadata.table.name.clone(),
            ContainerKind::Table {
                table: metadata.table.clone(),
            },
        );
        for column in columns {
            container.push_item(Item::new(ItemSource::Column(column.to_column_ref())));
        }
        container
    }

    /// An empty constants pseudo-table.
    pub fn constants(name: impl Into<String>) -> Self {
        Self::empty(name.into(), ContainerKind::Constants)
    }

    fn empty(name: String, kind: ContainerKind) -> Self {
        Self {
            id: ContainerId::new(),
            name,
            alias: None,
            position: Position::default(),
            kind,
            items: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.set_alias(Some(alias.into()));
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = position;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name used to qualify columns: the alias if set, else the name.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn kind(&self) -> &ContainerKind {
        &self.kind
    }

    /// The backing table, for table containers.
    pub fn table_ref(&self) -> Option<&TableRef> {
        match &self.kind {
            ContainerKind::Table { table } => Some(table),
            ContainerKind::Constants => None,
        }
    }

    pub fn is_constants(&self) -> bool {
        matches!(self.kind, ContainerKind::Constants)
    }

    /// Items mirror a table and cannot be edited.
    pub fn is_schema_backed(&self) -> bool {
        matches!(self.kind, ContainerKind::Table { .. })
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn item_at(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Resolve a wrapped domain object to the item wrapping it.
    pub fn item_for(&self, source: &ItemSource) -> Option<&Item> {
        self.items.iter().find(|item| item.source() == source)
    }

    /// Resolve a raw column name to its wrapping item.
    pub fn item_for_column(&self, column: &str) -> Option<&Item> {
        self.items
            .iter()
            .find(|item| matches!(item.source(), ItemSource::Column(c) if c.name == column))
    }

    pub(crate) fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Point every item's back reference at this container (after
    /// deserialization, where the reference may be missing).
    pub(crate) fn reattach_items(&mut self) {
        let id = self.id;
        for item in &mut self.items {
            item.set_container(Some(id));
        }
    }

    // -------------------------------------------------------------------------
    // Mutation
    // -------------------------------------------------------------------------

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the alias. Blank strings clear it.
    pub fn set_alias(&mut self, alias: Option<String>) {
        self.alias = alias.filter(|a| !a.trim().is_empty());
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    /// Insert an item at `index` (append when `None`).
    ///
    /// Only the constants container accepts new items.
    pub fn add_item(&mut self, mut item: Item, index: Option<usize>) -> QueryResult<ItemId> {
        self.ensure_editable()?;
        if self.index_of(item.id()).is_some() {
            return Err(QueryError::DuplicateItem(item.id()));
        }
        let index = index.unwrap_or(self.items.len());
        if index > self.items.len() {
            return Err(QueryError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        let id = item.id();
        item.set_container(Some(self.id));
        self.items.insert(index, item);
        Ok(id)
    }

    /// Remove an item by id. Only the constants container allows it.
    pub fn remove_item(&mut self, id: ItemId) -> QueryResult<Item> {
        self.ensure_editable()?;
        let index = self.index_of(id).ok_or(QueryError::UnknownItem(id))?;
        Ok(self.take_item_at(index))
    }

    /// Remove the item at `index`. Only the constants container allows it.
    pub fn remove_item_at(&mut self, index: usize) -> QueryResult<Item> {
        self.ensure_editable()?;
        if index >= self.items.len() {
            return Err(QueryError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.take_item_at(index))
    }

    /// Deep copy; items keep their ids.
    pub fn create_copy(&self) -> Container {
        self.clone()
    }

    /// Drain every item regardless of kind (container removal cascade).
    pub(crate) fn drain_items(&mut self) -> Vec<Item> {
        let mut items: Vec<Item> = self.items.drain(..).collect();
        for item in &mut items {
            item.set_container(None);
        }
        items
    }

    fn take_item_at(&mut self, index: usize) -> Item {
        let mut item = self.items.remove(index);
        item.set_container(None);
        item
    }

    fn push_item(&mut self, mut item: Item) {
        item.set_container(Some(self.id));
        self.items.push(item);
    }

    fn ensure_editable(&self) -> QueryResult<()> {
        if self.is_schema_backed() {
            return Err(QueryError::SchemaBacked(self.id));
        }
        Ok(())
    }
}

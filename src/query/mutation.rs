//! Mutation contract of the query: tables, joins, constants, ordinals and
//! per-entity attributes.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use super::events::{ItemProperty, JoinProperty, QueryEvent, QueryProperty};
use super::ordinals::{OrdinalChange, OrdinalKind};
use super::Query;
use crate::error::{QueryError, QueryResult};
use crate::metadata::resolve_table;
use crate::model::{
    Comparator, Container, ContainerId, GroupFunction, Item, ItemId, Join, JoinId, JoinSide,
    Position, SortDirection, TableRef,
};

impl Query {
    // =========================================================================
    // Tables
    // =========================================================================

    /// Insert a table container at `index` (append when `None`).
    ///
    /// Items that already carry selection or order-by ordinals are indexed;
    /// an ordinal held by another item is rejected before anything changes.
    pub fn add_table(&mut self, container: Container, index: Option<usize>) -> QueryResult<ContainerId> {
        if container.is_constants() {
            return Err(QueryError::ConstantsContainer);
        }
        let id = container.id();
        if self.container(id).is_some() {
            return Err(QueryError::DuplicateContainer(id));
        }
        let index = index.unwrap_or(self.from.len());
        if index > self.from.len() {
            return Err(QueryError::IndexOutOfRange {
                index,
                len: self.from.len(),
            });
        }

        let mut container = container;
        container.reattach_items();
        self.register_items(&container)?;
        self.from.insert(index, container);
        self.emit(QueryEvent::ContainerAdded {
            container: id,
            index,
        });
        Ok(id)
    }

    /// Add a table whose columns come from the metadata provider.
    ///
    /// A table that cannot be resolved still gets a container, with no
    /// items.
    pub fn attach_table(&mut self, table: TableRef, index: Option<usize>) -> QueryResult<ContainerId> {
        let metadata = match self.metadata.as_deref() {
            Some(provider) => resolve_table(provider, self.data_source.as_ref(), &table),
            None => {
                warn!(table = %table, "no metadata provider configured, table attached without columns");
                None
            }
        };

        let container = match metadata {
            Some(metadata) => Container::from_metadata(&metadata),
            None => Container::table(table, std::iter::empty::<String>()),
        };
        self.add_table(container, index)
    }

    /// Remove a table with its items and every join touching it.
    ///
    /// Returns false when the container is not part of the query.
    pub fn remove_table(&mut self, id: ContainerId) -> bool {
        let Some(index) = self.container_index(id) else {
            return false;
        };
        let name = self.from[index].name().to_string();

        self.compound_edit(format!("Remove table {}", name), |query| {
            let items: Vec<ItemId> = query.from[index].items().iter().map(Item::id).collect();
            for item in &items {
                query.release_ordinals(*item);
            }

            let joins: Vec<JoinId> = query.joins_for(id).to_vec();
            for join in joins {
                query.remove_join(join);
            }

            let mut container = query.from.remove(index);
            for item in container.drain_items() {
                query.owners.remove(&item.id());
                query.emit(QueryEvent::ItemRemoved {
                    container: id,
                    item: item.id(),
                });
            }
            query.join_index.remove(&id);
            query.emit(QueryEvent::ContainerRemoved { container: id });
        });

        debug!(table = %name, "table removed");
        true
    }

    fn register_items(&mut self, container: &Container) -> QueryResult<()> {
        let mut seen = HashSet::new();
        let mut selected = HashMap::new();
        let mut ordered = HashMap::new();

        for item in container.items() {
            let id = item.id();
            if self.owners.contains_key(&id) || !seen.insert(id) {
                return Err(QueryError::DuplicateItem(id));
            }
            if let Some(ordinal) = item.selected() {
                self.selection.check(id, ordinal)?;
                if let Some(holder) = selected.insert(ordinal, id) {
                    return Err(QueryError::DuplicateOrdinal {
                        space: OrdinalKind::Selection,
                        ordinal,
                        holder,
                        item: id,
                    });
                }
            }
            if let Some(ordinal) = item.order_by() {
                self.ordering.check(id, ordinal)?;
                if let Some(holder) = ordered.insert(ordinal, id) {
                    return Err(QueryError::DuplicateOrdinal {
                        space: OrdinalKind::OrderBy,
                        ordinal,
                        holder,
                        item: id,
                    });
                }
            }
        }

        for item in container.items() {
            self.owners.insert(item.id(), container.id());
            if let Some(ordinal) = item.selected() {
                self.selection.assign(item.id(), ordinal)?;
            }
            if let Some(ordinal) = item.order_by() {
                self.ordering.assign(item.id(), ordinal)?;
            }
        }
        Ok(())
    }

    // =========================================================================
    // Joins
    // =========================================================================

    /// Add a join between two items already in the query.
    ///
    /// When an endpoint container already has joins, its existing outer
    /// orientation is copied onto the new join's side.
    pub fn add_join(&mut self, mut join: Join) -> QueryResult<JoinId> {
        if let Some(existing) = self.joins.iter().find(|j| j.is_equivalent(&join)) {
            return Err(QueryError::DuplicateJoin(existing.id()));
        }

        for end in [join.left(), join.right()] {
            let container = self
                .container(end.container)
                .ok_or(QueryError::DanglingJoin {
                    join: join.id(),
                    container: end.container,
                })?;
            if container.item(end.item).is_none() {
                return Err(QueryError::UnknownItem(end.item));
            }
        }

        for container in [join.left().container, join.right().container] {
            let existing = self
                .joins_for(container)
                .first()
                .and_then(|id| self.join(*id))
                .and_then(|j| j.outer_for(container));
            if let (Some(outer), Some(side)) = (existing, join.side_of(container)) {
                join.set_outer(side, outer);
            }
        }

        let id = join.id();
        self.index_join(&join);
        self.joins.push(join);
        self.emit(QueryEvent::JoinAdded { join: id });
        Ok(id)
    }

    /// Remove a join. Returns false when it is not part of the query.
    pub fn remove_join(&mut self, id: JoinId) -> bool {
        let Some(index) = self.joins.iter().position(|j| j.id() == id) else {
            return false;
        };
        let join = self.joins.remove(index);
        self.unindex_join(&join);
        self.emit(QueryEvent::JoinRemoved { join: id });
        true
    }

    pub fn set_join_comparator(&mut self, id: JoinId, comparator: Comparator) -> QueryResult<()> {
        let join = self.join_mut(id).ok_or(QueryError::UnknownJoin(id))?;
        if join.comparator() != comparator {
            join.set_comparator(comparator);
            self.emit(QueryEvent::JoinPropertyChanged {
                join: id,
                property: JoinProperty::Comparator,
            });
        }
        Ok(())
    }

    /// Set the left container's outer flag on this join and on every other
    /// join touching that container.
    pub fn set_join_left_outer(&mut self, id: JoinId, outer: bool) -> QueryResult<()> {
        self.set_join_outer(id, JoinSide::Left, outer)
    }

    /// Set the right container's outer flag on this join and on every other
    /// join touching that container.
    pub fn set_join_right_outer(&mut self, id: JoinId, outer: bool) -> QueryResult<()> {
        self.set_join_outer(id, JoinSide::Right, outer)
    }

    fn set_join_outer(&mut self, id: JoinId, side: JoinSide, outer: bool) -> QueryResult<()> {
        let join = self.join(id).ok_or(QueryError::UnknownJoin(id))?;
        let container = match side {
            JoinSide::Left => join.left().container,
            JoinSide::Right => join.right().container,
        };

        let siblings: Vec<JoinId> = self.joins_for(container).to_vec();
        for sibling in siblings {
            let Some(join) = self.join_mut(sibling) else {
                continue;
            };
            let Some(sibling_side) = join.side_of(container) else {
                continue;
            };
            if join.outer(sibling_side) == outer {
                continue;
            }
            join.set_outer(sibling_side, outer);
            let property = match sibling_side {
                JoinSide::Left => JoinProperty::LeftOuter,
                JoinSide::Right => JoinProperty::RightOuter,
            };
            self.emit(QueryEvent::JoinPropertyChanged {
                join: sibling,
                property,
            });
        }
        Ok(())
    }

    fn join_mut(&mut self, id: JoinId) -> Option<&mut Join> {
        self.joins.iter_mut().find(|j| j.id() == id)
    }

    // =========================================================================
    // Constants
    // =========================================================================

    /// Add a literal/expression item to the constants container.
    pub fn add_constant(&mut self, item: Item, index: Option<usize>) -> QueryResult<ItemId> {
        let id = item.id();
        if self.owners.contains_key(&id) {
            return Err(QueryError::DuplicateItem(id));
        }
        let (selected, ordered) = (item.selected(), item.order_by());
        if let Some(ordinal) = selected {
            self.selection.check(id, ordinal)?;
        }
        if let Some(ordinal) = ordered {
            self.ordering.check(id, ordinal)?;
        }

        let container = self.constants.id();
        let position = index.unwrap_or(self.constants.len());
        self.constants.add_item(item, index)?;
        self.owners.insert(id, container);
        if let Some(ordinal) = selected {
            self.selection.assign(id, ordinal)?;
        }
        if let Some(ordinal) = ordered {
            self.ordering.assign(id, ordinal)?;
        }

        self.emit(QueryEvent::ItemAdded {
            container,
            item: id,
            index: position,
        });
        Ok(id)
    }

    /// Remove a constants item, unselecting it and dropping its joins.
    pub fn remove_constant(&mut self, id: ItemId) -> QueryResult<Item> {
        let container = self.constants.id();
        match self.owners.get(&id) {
            None => return Err(QueryError::UnknownItem(id)),
            Some(owner) if *owner != container => return Err(QueryError::SchemaBacked(*owner)),
            Some(_) => {}
        }

        self.compound_edit("Remove constant", |query| -> QueryResult<Item> {
            query.release_ordinals(id);

            let joins: Vec<JoinId> = query
                .joins
                .iter()
                .filter(|j| j.touches_item(id))
                .map(Join::id)
                .collect();
            for join in joins {
                query.remove_join(join);
            }

            let item = query.constants.remove_item(id)?;
            query.owners.remove(&id);
            query.emit(QueryEvent::ItemRemoved { container, item: id });
            Ok(item)
        })
    }

    // =========================================================================
    // Selection and ordering
    // =========================================================================

    /// Append an item to the SELECT list. Returns its ordinal.
    pub fn select_item(&mut self, id: ItemId) -> QueryResult<usize> {
        self.ensure_item(id)?;
        let changes = self.selection.push(id);
        self.apply_ordinals(OrdinalKind::Selection, changes);
        self.selection.get(id).ok_or(QueryError::UnknownItem(id))
    }

    /// Drop an item from the SELECT list, closing the gap. Returns false
    /// when it was not selected.
    pub fn unselect_item(&mut self, id: ItemId) -> QueryResult<bool> {
        self.ensure_item(id)?;
        let changes = self.selection.remove(id);
        let removed = !changes.is_empty();
        self.apply_ordinals(OrdinalKind::Selection, changes);
        Ok(removed)
    }

    /// Move a selected item to SELECT position `to`.
    pub fn move_item(&mut self, id: ItemId, to: usize) -> QueryResult<()> {
        self.ensure_item(id)?;
        let changes = self.selection.move_to(id, to)?;
        self.apply_ordinals(OrdinalKind::Selection, changes);
        Ok(())
    }

    /// Put an item at an explicit selection ordinal.
    pub fn assign_selection(&mut self, id: ItemId, ordinal: usize) -> QueryResult<()> {
        self.ensure_item(id)?;
        let changes = self.selection.assign(id, ordinal)?;
        self.apply_ordinals(OrdinalKind::Selection, changes);
        Ok(())
    }

    /// Append an item to ORDER BY (or keep its place) with `direction`.
    /// Returns its order-by ordinal.
    pub fn order_column(&mut self, id: ItemId, direction: SortDirection) -> QueryResult<usize> {
        self.ensure_item(id)?;
        let changes = self.ordering.push(id);
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
        self.set_item_order_direction(id, direction)?;
        self.ordering.get(id).ok_or(QueryError::UnknownItem(id))
    }

    /// Drop an item from ORDER BY. Returns false when it was not ordered.
    pub fn unorder_column(&mut self, id: ItemId) -> QueryResult<bool> {
        self.ensure_item(id)?;
        let changes = self.ordering.remove(id);
        let removed = !changes.is_empty();
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
        Ok(removed)
    }

    /// Make an item the last ORDER BY term, adding it when needed.
    pub fn move_order_by_item_to_end(&mut self, id: ItemId) -> QueryResult<usize> {
        self.ensure_item(id)?;
        let changes = self.ordering.move_to_end(id);
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
        self.ordering.get(id).ok_or(QueryError::UnknownItem(id))
    }

    /// Move an ordered item to ORDER BY position `to`.
    pub fn move_order_by_item(&mut self, id: ItemId, to: usize) -> QueryResult<()> {
        self.ensure_item(id)?;
        let changes = self.ordering.move_to(id, to)?;
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
        Ok(())
    }

    /// Put an item at an explicit order-by ordinal.
    pub fn assign_order_by(&mut self, id: ItemId, ordinal: usize) -> QueryResult<()> {
        self.ensure_item(id)?;
        let changes = self.ordering.assign(id, ordinal)?;
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
        Ok(())
    }

    fn release_ordinals(&mut self, id: ItemId) {
        let changes = self.selection.remove(id);
        self.apply_ordinals(OrdinalKind::Selection, changes);
        let changes = self.ordering.remove(id);
        self.apply_ordinals(OrdinalKind::OrderBy, changes);
    }

    fn apply_ordinals(&mut self, kind: OrdinalKind, changes: Vec<OrdinalChange>) {
        let property = match kind {
            OrdinalKind::Selection => ItemProperty::Selection,
            OrdinalKind::OrderBy => ItemProperty::OrderBy,
        };
        for (id, ordinal) in changes {
            if let Some(item) = self.item_mut(id) {
                match kind {
                    OrdinalKind::Selection => item.set_selected(ordinal),
                    OrdinalKind::OrderBy => item.set_order_by(ordinal),
                }
            }
            self.emit(QueryEvent::ItemPropertyChanged { item: id, property });
        }
    }

    fn ensure_item(&self, id: ItemId) -> QueryResult<()> {
        if self.owners.contains_key(&id) {
            Ok(())
        } else {
            Err(QueryError::UnknownItem(id))
        }
    }

    fn item_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        let owner = *self.owners.get(&id)?;
        self.container_mut(owner)?.item_mut(id)
    }

    fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        if self.constants.id() == id {
            return Some(&mut self.constants);
        }
        self.from.iter_mut().find(|c| c.id() == id)
    }

    // =========================================================================
    // Item attributes
    // =========================================================================

    pub fn set_item_alias(&mut self, id: ItemId, alias: Option<String>) -> QueryResult<()> {
        self.update_item(id, ItemProperty::Alias, |item| {
            let before = item.alias().map(str::to_owned);
            item.set_alias(alias);
            before.as_deref() != item.alias()
        })
    }

    /// Per-item WHERE text, e.g. `> 10`.
    pub fn set_item_filter(&mut self, id: ItemId, filter: Option<String>) -> QueryResult<()> {
        self.update_item(id, ItemProperty::Filter, |item| {
            let before = item.filter().map(str::to_owned);
            item.set_filter(filter);
            before.as_deref() != item.filter()
        })
    }

    pub fn set_item_having(&mut self, id: ItemId, having: Option<String>) -> QueryResult<()> {
        self.update_item(id, ItemProperty::Having, |item| {
            let before = item.having().map(str::to_owned);
            item.set_having(having);
            before.as_deref() != item.having()
        })
    }

    pub fn set_item_group_function(&mut self, id: ItemId, function: GroupFunction) -> QueryResult<()> {
        self.update_item(id, ItemProperty::GroupFunction, |item| {
            let changed = item.group_function() != function;
            item.set_group_function(function);
            changed
        })
    }

    pub fn set_item_order_direction(&mut self, id: ItemId, direction: SortDirection) -> QueryResult<()> {
        self.update_item(id, ItemProperty::OrderDirection, |item| {
            let changed = item.order_direction() != direction;
            item.set_order_direction(direction);
            changed
        })
    }

    pub fn set_item_width(&mut self, id: ItemId, width: Option<u32>) -> QueryResult<()> {
        self.update_item(id, ItemProperty::Width, |item| {
            let changed = item.width() != width;
            item.set_width(width);
            changed
        })
    }

    fn update_item(
        &mut self,
        id: ItemId,
        property: ItemProperty,
        update: impl FnOnce(&mut Item) -> bool,
    ) -> QueryResult<()> {
        let item = self.item_mut(id).ok_or(QueryError::UnknownItem(id))?;
        if update(item) {
            self.emit(QueryEvent::ItemPropertyChanged { item: id, property });
        }
        Ok(())
    }

    // =========================================================================
    // Container attributes
    // =========================================================================

    pub fn set_container_name(&mut self, id: ContainerId, name: impl Into<String>) -> QueryResult<()> {
        let name = name.into();
        self.update_container(id, QueryProperty::ContainerName(id), |container| {
            let changed = container.name() != name;
            container.set_name(name);
            changed
        })
    }

    pub fn set_container_alias(&mut self, id: ContainerId, alias: Option<String>) -> QueryResult<()> {
        self.update_container(id, QueryProperty::ContainerAlias(id), |container| {
            let before = container.alias().map(str::to_owned);
            container.set_alias(alias);
            before.as_deref() != container.alias()
        })
    }

    pub fn set_container_position(&mut self, id: ContainerId, position: Position) -> QueryResult<()> {
        self.update_container(id, QueryProperty::ContainerPosition(id), |container| {
            let changed = container.position() != position;
            container.set_position(position);
            changed
        })
    }

    fn update_container(
        &mut self,
        id: ContainerId,
        property: QueryProperty,
        update: impl FnOnce(&mut Container) -> bool,
    ) -> QueryResult<()> {
        let container = self
            .container_mut(id)
            .ok_or(QueryError::UnknownContainer(id))?;
        if update(container) {
            self.emit_property(property);
        }
        Ok(())
    }
}

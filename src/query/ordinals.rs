//! Dense ordinal spaces for selection and order-by positions.
//!
//! An [`OrdinalSpace`] maps ordinals to items and back. Each operation
//! returns the `(item, ordinal)` pairs it changed so the caller can mirror
//! them onto the items and notify listeners.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::model::ItemId;

/// Which ordinal space an ordinal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrdinalKind {
    Selection,
    OrderBy,
}

impl fmt::Display for OrdinalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrdinalKind::Selection => write!(f, "selection"),
            OrdinalKind::OrderBy => write!(f, "order-by"),
        }
    }
}

/// An ordinal change: the item and its new ordinal (`None` when removed).
pub type OrdinalChange = (ItemId, Option<usize>);

/// Bidirectional ordinal ↔ item map.
///
/// Push/remove/move keep the space dense (`0..len`). Only [`assign`]
/// (replaying saved state) can leave gaps.
///
/// [`assign`]: OrdinalSpace::assign
#[derive(Debug, Clone)]
pub struct OrdinalSpace {
    kind: OrdinalKind,
    by_ordinal: BTreeMap<usize, ItemId>,
    by_item: HashMap<ItemId, usize>,
}

impl OrdinalSpace {
    pub fn new(kind: OrdinalKind) -> Self {
        Self {
            kind,
            by_ordinal: BTreeMap::new(),
            by_item: HashMap::new(),
        }
    }

    pub fn kind(&self) -> OrdinalKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.by_ordinal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_ordinal.is_empty()
    }

    pub fn get(&self, item: ItemId) -> Option<usize> {
        self.by_item.get(&item).copied()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.by_item.contains_key(&item)
    }

    /// The item holding `ordinal`.
    pub fn holder(&self, ordinal: usize) -> Option<ItemId> {
        self.by_ordinal.get(&ordinal).copied()
    }

    /// Items in ascending ordinal order.
    pub fn items(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.by_ordinal.values().copied()
    }

    /// `(ordinal, item)` pairs in ascending ordinal order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, ItemId)> + '_ {
        self.by_ordinal.iter().map(|(o, i)| (*o, *i))
    }

    fn next_ordinal(&self) -> usize {
        self.by_ordinal
            .last_key_value()
            .map(|(max, _)| max + 1)
            .unwrap_or(0)
    }

    /// Check that `item` may take `ordinal`.
    pub fn check(&self, item: ItemId, ordinal: usize) -> QueryResult<()> {
        match self.holder(ordinal) {
            Some(holder) if holder != item => Err(QueryError::DuplicateOrdinal {
                space: self.kind,
                ordinal,
                holder,
                item,
            }),
            _ => Ok(()),
        }
    }

    /// Give `item` the next free ordinal (`max + 1`). No change when it
    /// already holds one.
    pub fn push(&mut self, item: ItemId) -> Vec<OrdinalChange> {
        if self.contains(item) {
            return Vec::new();
        }
        let ordinal = self.next_ordinal();
        self.insert(item, ordinal);
        vec![(item, Some(ordinal))]
    }

    /// Place `item` at an explicit ordinal. Fails when another item holds
    /// it. The item's previous ordinal is released without renumbering.
    pub fn assign(&mut self, item: ItemId, ordinal: usize) -> QueryResult<Vec<OrdinalChange>> {
        self.check(item, ordinal)?;
        if self.get(item) == Some(ordinal) {
            return Ok(Vec::new());
        }
        if let Some(old) = self.by_item.remove(&item) {
            self.by_ordinal.remove(&old);
        }
        self.insert(item, ordinal);
        Ok(vec![(item, Some(ordinal))])
    }

    /// Release `item`'s ordinal and close the gap: every greater ordinal
    /// moves down by one.
    pub fn remove(&mut self, item: ItemId) -> Vec<OrdinalChange> {
        let Some(removed) = self.by_item.remove(&item) else {
            return Vec::new();
        };
        self.by_ordinal.remove(&removed);

        let mut changes = vec![(item, None)];
        let above: Vec<(usize, ItemId)> = self
            .by_ordinal
            .range(removed + 1..)
            .map(|(o, i)| (*o, *i))
            .collect();
        for (ordinal, holder) in above {
            self.by_ordinal.remove(&ordinal);
            self.insert(holder, ordinal - 1);
            changes.push((holder, Some(ordinal - 1)));
        }
        changes
    }

    /// Move `item` to ordinal `to`, shifting only the ordinals between the
    /// old and new position one step toward the vacated slot.
    pub fn move_to(&mut self, item: ItemId, to: usize) -> QueryResult<Vec<OrdinalChange>> {
        let from = self.get(item).ok_or(QueryError::NotOrdered {
            space: self.kind,
            item,
        })?;
        let max = self.next_ordinal().saturating_sub(1);
        if to > max {
            return Err(QueryError::IndexOutOfRange {
                index: to,
                len: max + 1,
            });
        }
        if from == to {
            return Ok(Vec::new());
        }

        let (range, step_down) = if from < to {
            (from + 1..=to, true)
        } else {
            (to..=from - 1, false)
        };
        let shifted: Vec<(usize, ItemId)> = self
            .by_ordinal
            .range(range)
            .map(|(o, i)| (*o, *i))
            .collect();

        self.by_ordinal.remove(&from);
        for (ordinal, _) in &shifted {
            self.by_ordinal.remove(ordinal);
        }

        let mut changes = Vec::with_capacity(shifted.len() + 1);
        for (ordinal, holder) in shifted {
            let moved = if step_down { ordinal - 1 } else { ordinal + 1 };
            self.insert(holder, moved);
            changes.push((holder, Some(moved)));
        }
        self.insert(item, to);
        changes.push((item, Some(to)));
        Ok(changes)
    }

    /// Move `item` to the last ordinal, adding it when absent.
    pub fn move_to_end(&mut self, item: ItemId) -> Vec<OrdinalChange> {
        match self.get(item) {
            None => self.push(item),
            Some(_) => {
                let last = self.next_ordinal() - 1;
                self.move_to(item, last).unwrap_or_default()
            }
        }
    }

    fn insert(&mut self, item: ItemId, ordinal: usize) {
        self.by_ordinal.insert(ordinal, item);
        self.by_item.insert(item, ordinal);
    }
}

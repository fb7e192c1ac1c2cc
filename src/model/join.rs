//! Joins: comparator-typed edges between items of two containers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{ContainerId, ItemId, JoinId};
use super::item::Item;
use crate::error::{QueryError, QueryResult};

/// Comparison operator of a join condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Comparator {
    #[default]
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    GtEq,
    #[serde(rename = "<=")]
    LtEq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "LIKE")]
    Like,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT")]
    Not,
}

impl Comparator {
    pub fn token(&self) -> &'static str {
        match self {
            Comparator::Eq => "=",
            Comparator::Gt => ">",
            Comparator::Lt => "<",
            Comparator::GtEq => ">=",
            Comparator::LtEq => "<=",
            Comparator::NotEq => "<>",
            Comparator::Between => "BETWEEN",
            Comparator::Like => "LIKE",
            Comparator::In => "IN",
            Comparator::Not => "NOT",
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "=" => Ok(Comparator::Eq),
            ">" => Ok(Comparator::Gt),
            "<" => Ok(Comparator::Lt),
            ">=" => Ok(Comparator::GtEq),
            "<=" => Ok(Comparator::LtEq),
            "<>" | "!=" => Ok(Comparator::NotEq),
            "BETWEEN" => Ok(Comparator::Between),
            "LIKE" => Ok(Comparator::Like),
            "IN" => Ok(Comparator::In),
            "NOT" => Ok(Comparator::Not),
            other => Err(format!("unknown comparator: {}", other)),
        }
    }
}

/// Which end of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinSide {
    Left,
    Right,
}

/// Type of join emitted between two containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

/// One end of a join: an item and the container that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JoinEnd {
    pub container: ContainerId,
    pub item: ItemId,
}

impl JoinEnd {
    fn of(item: &Item) -> QueryResult<Self> {
        let container = item.container().ok_or(QueryError::DetachedItem(item.id()))?;
        Ok(Self {
            container,
            item: item.id(),
        })
    }
}

/// A directed pair of items with a comparator and per-side outer flags.
///
/// Both flags false is an inner join, both true a full outer join. The
/// endpoints are fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Join {
    id: JoinId,
    left: JoinEnd,
    right: JoinEnd,
    #[serde(default)]
    comparator: Comparator,
    #[serde(default)]
    left_outer: bool,
    #[serde(default)]
    right_outer: bool,
}

impl Join {
    /// An inner equi-join between two items of different containers.
    pub fn new(left: &Item, right: &Item) -> QueryResult<Self> {
        Self::between(JoinId::new(), left, right)
    }

    fn between(id: JoinId, left: &Item, right: &Item) -> QueryResult<Self> {
        let left = JoinEnd::of(left)?;
        let right = JoinEnd::of(right)?;
        if left.container == right.container {
            return Err(QueryError::SameContainerJoin(left.container));
        }
        Ok(Self {
            id,
            left,
            right,
            comparator: Comparator::Eq,
            left_outer: false,
            right_outer: false,
        })
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_outer(mut self, left_outer: bool, right_outer: bool) -> Self {
        self.left_outer = left_outer;
        self.right_outer = right_outer;
        self
    }

    pub fn id(&self) -> JoinId {
        self.id
    }

    pub fn left(&self) -> JoinEnd {
        self.left
    }

    pub fn right(&self) -> JoinEnd {
        self.right
    }

    pub fn comparator(&self) -> Comparator {
        self.comparator
    }

    pub fn left_outer(&self) -> bool {
        self.left_outer
    }

    pub fn right_outer(&self) -> bool {
        self.right_outer
    }

    pub fn set_comparator(&mut self, comparator: Comparator) {
        self.comparator = comparator;
    }

    /// Set the left flag on this join only. Use
    /// [`Query::set_join_left_outer`](crate::query::Query::set_join_left_outer)
    /// to keep sibling joins uniform.
    pub fn set_left_outer(&mut self, outer: bool) {
        self.left_outer = outer;
    }

    /// Set the right flag on this join only.
    pub fn set_right_outer(&mut self, outer: bool) {
        self.right_outer = outer;
    }

    /// Whether either end lives in `container`.
    pub fn touches(&self, container: ContainerId) -> bool {
        self.left.container == container || self.right.container == container
    }

    pub fn touches_item(&self, item: ItemId) -> bool {
        self.left.item == item || self.right.item == item
    }

    /// The side `container` sits on.
    pub fn side_of(&self, container: ContainerId) -> Option<JoinSide> {
        if self.left.container == container {
            Some(JoinSide::Left)
        } else if self.right.container == container {
            Some(JoinSide::Right)
        } else {
            None
        }
    }

    /// The end opposite to `container`.
    pub fn other_end(&self, container: ContainerId) -> Option<JoinEnd> {
        match self.side_of(container)? {
            JoinSide::Left => Some(self.right),
            JoinSide::Right => Some(self.left),
        }
    }

    pub fn outer(&self, side: JoinSide) -> bool {
        match side {
            JoinSide::Left => self.left_outer,
            JoinSide::Right => self.right_outer,
        }
    }

    pub fn set_outer(&mut self, side: JoinSide, outer: bool) {
        match side {
            JoinSide::Left => self.left_outer = outer,
            JoinSide::Right => self.right_outer = outer,
        }
    }

    /// The outer flag `container` carries on this join.
    pub fn outer_for(&self, container: ContainerId) -> Option<bool> {
        self.side_of(container).map(|side| self.outer(side))
    }

    /// Join keyword when the container `first` has been emitted before the
    /// other end.
    pub fn kind_from(&self, first: ContainerId) -> JoinKind {
        let (first_outer, second_outer) = if first == self.left.container {
            (self.left_outer, self.right_outer)
        } else {
            (self.right_outer, self.left_outer)
        };
        match (first_outer, second_outer) {
            (true, true) => JoinKind::FullOuter,
            (true, false) => JoinKind::LeftOuter,
            (false, true) => JoinKind::RightOuter,
            (false, false) => JoinKind::Inner,
        }
    }

    /// Same endpoints and comparator; such a join would be redundant.
    pub fn is_equivalent(&self, other: &Join) -> bool {
        self.id == other.id
            || (self.left == other.left
                && self.right == other.right
                && self.comparator == other.comparator)
    }

    /// A join between replacement items with this join's comparator and
    /// flags. The id is kept, matching item copies.
    pub fn create_copy(&self, left: &Item, right: &Item) -> QueryResult<Join> {
        Ok(Self::between(self.id, left, right)?
            .with_comparator(self.comparator)
            .with_outer(self.left_outer, self.right_outer))
    }
}

//! Query graph model: containers, items and joins.

pub mod container;
pub mod ids;
pub mod item;
pub mod join;

pub use container::{Container, ContainerKind, Position, TableRef};
pub use ids::{ContainerId, ItemId, JoinId};
pub use item::{ColumnRef, Expression, GroupFunction, Item, ItemSource, SortDirection};
pub use join::{Comparator, Join, JoinEnd, JoinKind, JoinSide};

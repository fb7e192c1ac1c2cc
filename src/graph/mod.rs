//! Join graph: from-containers as nodes, joins as edges.
//!
//! ```text
//!   Orders ──[o.customer_id = c.id]── Customers
//!      │
//!   [o.id = l.order_id]
//!      │
//!   Lines                Regions   (no joins: separate tree)
//! ```
//!
//! The graph is an immutable snapshot built at generation time. Two
//! containers connected by several joins share one edge whose weight lists
//! every join id, in insertion order.

pub mod linearize;

use petgraph::graphmap::UnGraphMap;

use crate::model::{ContainerId, Join, JoinId};

pub use linearize::{emission_order, finish_order, finish_trees};

/// Undirected multi-join graph over container ids.
#[derive(Debug, Clone, Default)]
pub struct JoinGraph {
    graph: UnGraphMap<ContainerId, Vec<JoinId>>,
}

impl JoinGraph {
    /// Build a graph over `nodes` (kept in the given order). Joins whose
    /// endpoints are not both nodes are ignored.
    pub fn new<'a, N, J>(nodes: N, joins: J) -> Self
    where
        N: IntoIterator<Item = ContainerId>,
        J: IntoIterator<Item = &'a Join>,
    {
        let mut graph: UnGraphMap<ContainerId, Vec<JoinId>> = UnGraphMap::new();
        for node in nodes {
            graph.add_node(node);
        }

        for join in joins {
            let (a, b) = (join.left().container, join.right().container);
            if !graph.contains_node(a) || !graph.contains_node(b) {
                continue;
            }
            match graph.edge_weight_mut(a, b) {
                Some(ids) => ids.push(join.id()),
                None => {
                    graph.add_edge(a, b, vec![join.id()]);
                }
            }
        }

        Self { graph }
    }

    /// Containers in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = ContainerId> + '_ {
        self.graph.nodes()
    }

    /// Every connected pair with the joins between them.
    pub fn edges(&self) -> impl Iterator<Item = (ContainerId, ContainerId, &[JoinId])> + '_ {
        self.graph
            .all_edges()
            .map(|(a, b, ids)| (a, b, ids.as_slice()))
    }

    /// Containers sharing at least one join with `node`.
    pub fn adjacent(&self, node: ContainerId) -> impl Iterator<Item = ContainerId> + '_ {
        self.graph.neighbors(node)
    }

    /// Join ids between two containers, in insertion order.
    pub fn joins_between(&self, a: ContainerId, b: ContainerId) -> &[JoinId] {
        self.graph
            .edge_weight(a, b)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of connected components.
    pub fn component_count(&self) -> usize {
        finish_trees(&self.graph).len()
    }

    /// Depth-first finish order of the containers.
    pub fn finish_order(&self) -> Vec<ContainerId> {
        finish_order(&self.graph)
    }

    /// The order containers are written to FROM/JOIN.
    pub fn emission_order(&self) -> Vec<ContainerId> {
        emission_order(&self.graph)
    }
}

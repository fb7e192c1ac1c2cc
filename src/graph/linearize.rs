//! Depth-first linearization of an undirected graph.
//!
//! The traversal is generic over petgraph's visitor traits so it can run on
//! any graph type, not only the join graph. Every node is visited: roots are
//! taken in node order, and each unvisited root starts a new tree.

use petgraph::visit::{DfsPostOrder, IntoNeighbors, IntoNodeIdentifiers, VisitMap, Visitable};

/// Post-order (finish order) node sequences, one per depth-first tree.
///
/// Trees are listed in the order their roots appear in `graph`'s node
/// iteration; within a tree, a node appears after every node discovered from
/// it.
pub fn finish_trees<G>(graph: G) -> Vec<Vec<G::NodeId>>
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
{
    let mut dfs = DfsPostOrder::empty(graph);
    let mut trees = Vec::new();

    for root in graph.node_identifiers() {
        if dfs.finished.is_visited(&root) {
            continue;
        }
        dfs.move_to(root);
        let mut tree = Vec::new();
        while let Some(node) = dfs.next(graph) {
            tree.push(node);
        }
        trees.push(tree);
    }

    trees
}

/// Flat finish order over the whole graph.
pub fn finish_order<G>(graph: G) -> Vec<G::NodeId>
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
{
    finish_trees(graph).into_iter().flatten().collect()
}

/// Emission order: each tree's finish order reversed, trees kept in root
/// order.
///
/// Reversing a tree's post-order puts its root first and guarantees every
/// later node has a tree edge to some earlier node.
pub fn emission_order<G>(graph: G) -> Vec<G::NodeId>
where
    G: IntoNodeIdentifiers + IntoNeighbors + Visitable,
{
    finish_trees(graph)
        .into_iter()
        .flat_map(|tree| tree.into_iter().rev())
        .collect()
}

// src/dag/validate.rs

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;

use crate::dag::node::{Node, NodeIndex};
use crate::errors::GraphError;

/// Fail with [`GraphError::Cycle`] if the wired nodes contain a cycle.
///
/// Edge direction: parent -> child. A loader that consumes one of its own
/// produced fields forms a self-loop, which also counts as a cycle.
pub fn ensure_acyclic<R>(nodes: &[Node<R>]) -> Result<(), GraphError> {
    let mut graph: DiGraphMap<NodeIndex, ()> = DiGraphMap::new();

    for i in 0..nodes.len() {
        graph.add_node(i);
    }
    for (parent, node) in nodes.iter().enumerate() {
        for &child in node.children() {
            graph.add_edge(parent, child, ());
        }
    }

    // A topological sort fails exactly when there is a cycle.
    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let start = cycle.node_id();
            // Report every member of the strongly connected component that
            // contains the offending node, not just the node itself.
            let members = tarjan_scc(&graph)
                .into_iter()
                .find(|scc| scc.contains(&start))
                .unwrap_or_else(|| vec![start]);

            let mut ids: Vec<String> = members
                .into_iter()
                .map(|i| nodes[i].id().to_string())
                .collect();
            ids.sort();
            Err(GraphError::Cycle(ids))
        }
    }
}

// src/dag/select.rs

use std::collections::HashSet;

use crate::dag::graph::Graph;
use crate::dag::node::{NodeIndex, NodeKind};
use crate::errors::GraphError;

impl<R> Graph<R> {
    /// Nodes that must run to evaluate the given filters.
    ///
    /// - No ids: every node in the graph.
    /// - Otherwise: each requested filter plus all of its transitive parents.
    ///   Shared ancestors appear once. Order is not significant; the executor
    ///   derives its own order from in-degrees.
    ///
    /// Every id is checked before any traversal happens, so an unknown id
    /// never yields a partial selection.
    pub fn select<S: AsRef<str>>(&self, filter_ids: &[S]) -> Result<Vec<NodeIndex>, GraphError> {
        if filter_ids.is_empty() {
            return Ok((0..self.len()).collect());
        }

        let mut starts = Vec::with_capacity(filter_ids.len());
        for id in filter_ids {
            let id = id.as_ref();
            match self.index_of(id) {
                Some(i) if self.node_at(i).kind() == NodeKind::Filter => starts.push(i),
                _ => return Err(GraphError::UnknownFilter(id.to_string())),
            }
        }

        let mut visited: HashSet<NodeIndex> = HashSet::new();
        let mut selected = Vec::new();

        for start in starts {
            let mut stack = vec![start];
            while let Some(i) = stack.pop() {
                if !visited.insert(i) {
                    continue;
                }
                selected.push(i);
                stack.extend(
                    self.node_at(i)
                        .parents()
                        .iter()
                        .copied()
                        .filter(|p| !visited.contains(p)),
                );
            }
        }

        Ok(selected)
    }
}

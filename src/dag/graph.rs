// src/dag/graph.rs

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dag::node::{Node, NodeIndex, NodeKind, TaskHandle};
use crate::dag::validate::ensure_acyclic;
use crate::errors::GraphError;
use crate::task::{Filter, Loader};
use crate::types::FieldId;

/// Immutable task graph.
///
/// Built once from the full set of loaders and filters and then shared
/// read-only by every invocation. Nothing in here changes per request; the
/// per-call bookkeeping (in-degrees, the field store) lives elsewhere.
pub struct Graph<R> {
    nodes: Vec<Node<R>>,
    index: HashMap<String, NodeIndex>,
}

impl<R> Graph<R> {
    /// Build the graph, resolving every consumed field to the loader that
    /// produces it.
    ///
    /// Loaders come first in node order, then filters, each in the order
    /// given. That order is also the order filters run in within one batch.
    pub fn build(
        loaders: Vec<Arc<dyn Loader<R>>>,
        filters: Vec<Arc<dyn Filter<R>>>,
    ) -> Result<Self, GraphError> {
        let mut nodes: Vec<Node<R>> = Vec::with_capacity(loaders.len() + filters.len());
        let mut index: HashMap<String, NodeIndex> = HashMap::new();

        let handles = loaders
            .into_iter()
            .map(TaskHandle::Loader)
            .chain(filters.into_iter().map(TaskHandle::Filter));

        for handle in handles {
            let node = Node::new(handle);
            if index.contains_key(node.id()) {
                return Err(GraphError::DuplicateId(node.id().to_string()));
            }
            if node.is_filter() {
                if let Some(field) = node.produces().iter().next() {
                    return Err(GraphError::FilterProduces {
                        filter: node.id().to_string(),
                        field: field.to_string(),
                    });
                }
            }
            index.insert(node.id().to_string(), nodes.len());
            nodes.push(node);
        }

        let producers = producer_index(&nodes)?;
        wire_edges(&mut nodes, &producers)?;
        ensure_acyclic(&nodes)?;

        debug!(
            nodes = nodes.len(),
            fields = producers.len(),
            "task graph built"
        );

        Ok(Self { nodes, index })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node<R>] {
        &self.nodes
    }

    pub fn node(&self, id: &str) -> Option<&Node<R>> {
        self.index.get(id).map(|&i| &self.nodes[i])
    }

    pub fn index_of(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    /// Node at `index`. Panics if out of range, like slice indexing.
    pub fn node_at(&self, index: NodeIndex) -> &Node<R> {
        &self.nodes[index]
    }

    /// Nodes with no parents.
    pub fn roots(&self) -> impl Iterator<Item = &Node<R>> {
        self.nodes.iter().filter(|n| n.parents.is_empty())
    }

    /// Ids of every filter, in declaration order.
    pub fn filter_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes
            .iter()
            .filter(|n| n.kind() == NodeKind::Filter)
            .map(|n| n.id())
    }
}

impl<R> fmt::Debug for Graph<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph").field("nodes", &self.nodes).finish()
    }
}

/// Map each produced field to its (single) loader.
fn producer_index<R>(nodes: &[Node<R>]) -> Result<HashMap<FieldId, NodeIndex>, GraphError> {
    let mut producers: HashMap<FieldId, NodeIndex> = HashMap::new();

    for (i, node) in nodes.iter().enumerate() {
        for field in node.produces().iter() {
            if let Some(&first) = producers.get(field) {
                return Err(GraphError::DuplicateProducer {
                    field: field.to_string(),
                    first: nodes[first].id().to_string(),
                    second: node.id().to_string(),
                });
            }
            producers.insert(field.to_string(), i);
        }
    }

    Ok(producers)
}

/// Record parent/child edges. A node consuming several fields of the same
/// loader gets a single edge to it.
fn wire_edges<R>(
    nodes: &mut [Node<R>],
    producers: &HashMap<FieldId, NodeIndex>,
) -> Result<(), GraphError> {
    for child in 0..nodes.len() {
        // Clone to avoid holding a borrow of `nodes` while mutating parents.
        let consumed: Vec<FieldId> = nodes[child].consumes().iter().map(String::from).collect();

        for field in consumed {
            let parent = *producers
                .get(&field)
                .ok_or_else(|| GraphError::UnknownField {
                    consumer: nodes[child].id().to_string(),
                    field: field.clone(),
                })?;

            if nodes[child].parents.contains(&parent) {
                continue;
            }
            nodes[child].parents.push(parent);
            nodes[parent].children.push(child);
        }
    }

    Ok(())
}

// src/dag/node.rs

//! Loader/filter unification.

use std::fmt;
use std::sync::Arc;

use crate::task::{Capability, Filter, Loader};
use crate::types::FieldSet;

/// Position of a node inside its [`crate::dag::Graph`].
pub type NodeIndex = usize;

/// Which kind of task a node wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Loader,
    Filter,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Loader => f.write_str("loader"),
            NodeKind::Filter => f.write_str("filter"),
        }
    }
}

/// The task behind a node.
pub enum TaskHandle<R> {
    Loader(Arc<dyn Loader<R>>),
    Filter(Arc<dyn Filter<R>>),
}

impl<R> TaskHandle<R> {
    pub fn kind(&self) -> NodeKind {
        match self {
            TaskHandle::Loader(_) => NodeKind::Loader,
            TaskHandle::Filter(_) => NodeKind::Filter,
        }
    }

    fn id(&self) -> &str {
        match self {
            TaskHandle::Loader(l) => l.id(),
            TaskHandle::Filter(f) => f.id(),
        }
    }

    fn declared_fields(&self) -> (FieldSet, FieldSet) {
        match self {
            TaskHandle::Loader(l) => (l.consumes(), l.produces()),
            TaskHandle::Filter(f) => (f.consumes(), f.produces()),
        }
    }
}

impl<R> Clone for TaskHandle<R> {
    fn clone(&self) -> Self {
        match self {
            TaskHandle::Loader(l) => TaskHandle::Loader(Arc::clone(l)),
            TaskHandle::Filter(f) => TaskHandle::Filter(Arc::clone(f)),
        }
    }
}

/// One schedulable unit plus its resolved edges.
///
/// The declared field sets are captured once at build time; the edges are
/// fixed after [`crate::dag::Graph::build`] returns.
pub struct Node<R> {
    pub(crate) id: String,
    pub(crate) task: TaskHandle<R>,
    pub(crate) consumes: FieldSet,
    pub(crate) produces: FieldSet,
    /// Nodes producing fields this node consumes.
    pub(crate) parents: Vec<NodeIndex>,
    /// Nodes consuming fields this node produces.
    pub(crate) children: Vec<NodeIndex>,
}

impl<R> Node<R> {
    pub(crate) fn new(task: TaskHandle<R>) -> Self {
        let id = task.id().to_string();
        let (consumes, produces) = task.declared_fields();
        Self {
            id,
            task,
            consumes,
            produces,
            parents: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.task.kind()
    }

    pub fn is_filter(&self) -> bool {
        self.kind() == NodeKind::Filter
    }

    pub fn task(&self) -> &TaskHandle<R> {
        &self.task
    }

    pub fn consumes(&self) -> &FieldSet {
        &self.consumes
    }

    pub fn produces(&self) -> &FieldSet {
        &self.produces
    }

    pub fn parents(&self) -> &[NodeIndex] {
        &self.parents
    }

    pub fn children(&self) -> &[NodeIndex] {
        &self.children
    }
}

impl<R> fmt::Debug for Node<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("consumes", &self.consumes)
            .field("produces", &self.produces)
            .field("parents", &self.parents)
            .field("children", &self.children)
            .finish()
    }
}

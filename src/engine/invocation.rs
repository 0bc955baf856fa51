// src/engine/invocation.rs

//! State shared by all tasks of one `execute` call.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::dag::{Graph, Node, NodeIndex, TaskHandle};
use crate::engine::EngineOptions;
use crate::errors::FieldFault;
use crate::store::FieldStore;
use crate::task::{CancelToken, Filter, Loader, TaskContext};
use crate::types::TraceId;

/// What a finished node reports back to the driving loop.
#[derive(Debug)]
pub(crate) enum Completion {
    /// A loader finished, or a filter let the request through.
    Passed,
    /// A filter rejected the request.
    Rejected { node: NodeIndex },
    /// A task broke its field contract.
    Fault { node: NodeIndex, fault: FieldFault },
}

pub(crate) type LoaderRef<R> = (NodeIndex, Arc<dyn Loader<R>>);
pub(crate) type FilterRef<R> = (NodeIndex, Arc<dyn Filter<R>>);

/// Runnable nodes released by one completion, split by kind.
pub(crate) struct Released<R> {
    pub loaders: Vec<LoaderRef<R>>,
    pub filters: Vec<FilterRef<R>>,
}

impl<R> Released<R> {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            filters: Vec::new(),
        }
    }

    pub fn push(&mut self, index: NodeIndex, task: &TaskHandle<R>) {
        match task {
            TaskHandle::Loader(l) => self.loaders.push((index, Arc::clone(l))),
            TaskHandle::Filter(f) => self.filters.push((index, Arc::clone(f))),
        }
    }

    /// Put both lists in declaration order.
    pub fn sort(&mut self) {
        self.loaders.sort_unstable_by_key(|(i, _)| *i);
        self.filters.sort_unstable_by_key(|(i, _)| *i);
    }
}

/// Everything a running node needs, behind one `Arc`.
///
/// The graph is shared with other invocations; everything else here belongs
/// to this call alone.
pub(crate) struct Invocation<R> {
    pub graph: Arc<Graph<R>>,
    pub request: Arc<R>,
    pub store: Arc<FieldStore>,
    pub trace_id: TraceId,
    pub options: EngineOptions,
    pub cancel: CancelToken,
    /// Remaining unfinished parents per selected node.
    pub in_degree: Mutex<HashMap<NodeIndex, usize>>,
    pub done: mpsc::Sender<Completion>,
}

impl<R> Invocation<R> {
    pub fn task_context(&self, node: &Node<R>) -> TaskContext {
        TaskContext::new(self.trace_id, node.id(), self.cancel.clone())
    }

    /// Send a completion to the driving loop.
    ///
    /// The channel holds one slot per selected node and each node reports at
    /// most once, so this never has to wait. A closed channel means the
    /// driver already returned; the report is simply dropped.
    pub fn report(&self, completion: Completion) {
        if let Err(mpsc::error::TrySendError::Full(c)) = self.done.try_send(completion) {
            warn!(completion = ?c, "completion channel full; dropping report");
        }
    }

    /// Mark `parent` as finished and return the children that just became
    /// runnable. Children outside the selected sub-graph are ignored.
    pub fn release_children(&self, parent: NodeIndex) -> Released<R> {
        let mut released = Released::new();
        let mut degrees = self
            .in_degree
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for &child in self.graph.node_at(parent).children() {
            let Some(degree) = degrees.get_mut(&child) else {
                continue;
            };
            *degree = degree.saturating_sub(1);
            if *degree == 0 {
                let node = self.graph.node_at(child);
                debug!(node = node.id(), parent = self.graph.node_at(parent).id(), "node runnable");
                released.push(child, node.task());
            }
        }

        released
    }

    /// Check that a loader wrote every field it declared.
    pub fn verify_written(&self, node: &Node<R>) -> Result<(), FieldFault> {
        if !self.options.require_all_fields_written {
            return Ok(());
        }
        match node.produces().iter().find(|f| !self.store.contains(f)) {
            Some(field) => Err(FieldFault::Unwritten {
                task: node.id().to_string(),
                field: field.to_string(),
            }),
            None => Ok(()),
        }
    }
}

// src/engine/executor.rs

//! Concurrent execution of a selected sub-graph.
//!
//! The driving loop seeds every node with no selected parents, then waits on
//! a completion channel:
//! - ready loaders each get their own Tokio task;
//! - ready filters are cheap and synchronous, so a whole batch of them runs
//!   in one task, in declaration order, stopping at the first rejection;
//! - when a loader finishes it decrements its children's in-degrees under a
//!   single lock and dispatches whatever became runnable. The last runnable
//!   loader is run on the current task instead of a fresh one (see
//!   `EngineOptions::reuse_current_task`).
//!
//! The first rejection (or fault) returns immediately. Tasks that are still
//! running are left to finish in the background; they check the cancellation
//! flag before starting a node and before releasing its children, so nothing
//! new starts once the answer is known.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{debug, info, warn, Instrument};

use crate::dag::{Graph, NodeIndex};
use crate::engine::invocation::{Completion, FilterRef, Invocation, LoaderRef, Released};
use crate::engine::EngineOptions;
use crate::errors::EngineError;
use crate::store::FieldStore;
use crate::task::CancelHandle;
use crate::types::TraceId;

/// Run `targets` (a sub-graph closed under parents) and report whether any
/// filter rejected the request.
pub(crate) async fn execute<R>(
    graph: Arc<Graph<R>>,
    options: EngineOptions,
    trace_id: TraceId,
    request: Arc<R>,
    store: Arc<FieldStore>,
    targets: Vec<NodeIndex>,
) -> Result<bool, EngineError>
where
    R: Send + Sync + 'static,
{
    let expected = targets.len();
    if expected == 0 {
        debug!("nothing selected; request passes");
        return Ok(false);
    }

    let (in_degree, ready) = initial_in_degrees(&graph, &targets);
    debug!(
        selected = expected,
        ready_loaders = ready.loaders.len(),
        ready_filters = ready.filters.len(),
        "starting invocation"
    );

    // Cancelled on every way out of this function, including the caller
    // dropping the future.
    let cancel = CancelHandle::new();
    let (done_tx, mut done_rx) = mpsc::channel::<Completion>(expected);

    let invocation = Arc::new(Invocation {
        graph,
        request,
        store,
        trace_id,
        options,
        cancel: cancel.token(),
        in_degree: Mutex::new(in_degree),
        done: done_tx,
    });

    spawn_filter_batch(&invocation, ready.filters);
    for loader in ready.loaders {
        spawn_loader(&invocation, loader);
    }
    // From here on only the running tasks keep the sender alive, so the
    // channel closes if they all end without reporting.
    let graph = Arc::clone(&invocation.graph);
    drop(invocation);

    let mut completed = 0;
    while let Some(completion) = done_rx.recv().await {
        match completion {
            Completion::Passed => {
                completed += 1;
                if completed == expected {
                    info!(completed, "all selected tasks passed");
                    return Ok(false);
                }
            }
            Completion::Rejected { node } => {
                cancel.cancel();
                info!(
                    node = graph.node_at(node).id(),
                    completed, expected, "request rejected"
                );
                return Ok(true);
            }
            Completion::Fault { node, fault } => {
                cancel.cancel();
                let node = graph.node_at(node).id().to_string();
                warn!(node = %node, error = %fault, "task fault; aborting invocation");
                return Err(EngineError::Task { node, fault });
            }
        }
    }

    warn!(completed, expected, "all tasks ended before every node reported");
    Err(EngineError::Incomplete {
        completed,
        expected,
    })
}

/// In-degree of each target counted over parents that are themselves
/// selected, plus the nodes that are ready right away.
///
/// Ready filters are sorted so that a batch runs in declaration order.
fn initial_in_degrees<R>(
    graph: &Graph<R>,
    targets: &[NodeIndex],
) -> (HashMap<NodeIndex, usize>, Released<R>) {
    let selected: HashSet<NodeIndex> = targets.iter().copied().collect();
    let mut in_degree = HashMap::with_capacity(targets.len());
    let mut ready = Released::new();

    for &index in targets {
        let node = graph.node_at(index);
        let degree = node
            .parents()
            .iter()
            .filter(|p| selected.contains(p))
            .count();
        in_degree.insert(index, degree);
        if degree == 0 {
            ready.push(index, node.task());
        }
    }

    ready.sort();
    (in_degree, ready)
}

fn spawn_loader<R>(invocation: &Arc<Invocation<R>>, loader: LoaderRef<R>)
where
    R: Send + Sync + 'static,
{
    let invocation = Arc::clone(invocation);
    tokio::spawn(run_loader_chain(invocation, loader).in_current_span());
}

fn spawn_filter_batch<R>(invocation: &Arc<Invocation<R>>, batch: Vec<FilterRef<R>>)
where
    R: Send + Sync + 'static,
{
    if batch.is_empty() {
        return;
    }
    let invocation = Arc::clone(invocation);
    tokio::spawn(
        async move {
            run_filter_batch(&invocation, &batch);
        }
        .in_current_span(),
    );
}

/// Run a loader, then keep going on this task with one of the loaders it
/// released.
async fn run_loader_chain<R>(invocation: Arc<Invocation<R>>, start: LoaderRef<R>)
where
    R: Send + Sync + 'static,
{
    let mut next = Some(start);

    while let Some((index, loader)) = next.take() {
        let node = invocation.graph.node_at(index);
        if invocation.cancel.is_cancelled() {
            debug!(node = node.id(), "cancelled before start");
            return;
        }

        debug!(node = node.id(), "loader started");
        let ctx = invocation.task_context(node);
        let outcome = loader
            .load(&ctx, &invocation.request, &invocation.store)
            .await
            .and_then(|()| invocation.verify_written(node));

        if let Err(fault) = outcome {
            invocation.report(Completion::Fault { node: index, fault });
            return;
        }
        debug!(node = node.id(), "loader finished");
        invocation.report(Completion::Passed);

        if invocation.cancel.is_cancelled() {
            return;
        }

        let Released {
            mut loaders,
            filters,
        } = invocation.release_children(index);
        let reuse = invocation.options.reuse_current_task;

        if !filters.is_empty() {
            if loaders.is_empty() && reuse {
                run_filter_batch(&invocation, &filters);
            } else {
                spawn_filter_batch(&invocation, filters);
            }
        }

        if reuse {
            next = loaders.pop();
        }
        for loader in loaders {
            spawn_loader(&invocation, loader);
        }
    }
}

/// Run filters one after another; the first rejection or fault ends the batch.
fn run_filter_batch<R>(invocation: &Invocation<R>, batch: &[FilterRef<R>]) {
    for (index, filter) in batch {
        let node = invocation.graph.node_at(*index);
        if invocation.cancel.is_cancelled() {
            debug!(node = node.id(), "filter batch cancelled");
            return;
        }

        let ctx = invocation.task_context(node);
        match filter.filter(&ctx, &invocation.request, &invocation.store) {
            Ok(true) => {
                debug!(node = node.id(), "filter passed");
                invocation.report(Completion::Passed);
            }
            Ok(false) => {
                debug!(node = node.id(), "filter rejected");
                invocation.report(Completion::Rejected { node: *index });
                return;
            }
            Err(fault) => {
                invocation.report(Completion::Fault {
                    node: *index,
                    fault,
                });
                return;
            }
        }
    }
}

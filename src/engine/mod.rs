// src/engine/mod.rs

//! Orchestration engine.
//!
//! [`Engine`] owns the immutable task graph and runs it on demand:
//! 1. select the sub-graph feeding the requested filters
//!    ([`crate::dag::Graph::select`]);
//! 2. execute it concurrently in dependency order, sharing
//!    data through a per-call [`FieldStore`];
//! 3. return `true` as soon as any filter rejects, `false` once every
//!    selected node has passed.
//!
//! One `Engine` can serve many concurrent `execute` calls; each call brings
//! its own store and keeps its own in-degree bookkeeping.

mod executor;
pub(crate) mod invocation;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::dag::Graph;
use crate::errors::{EngineError, GraphError};
use crate::store::FieldStore;
use crate::task::{Filter, Loader};
use crate::types::TraceId;

/// Tunables for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// When a loader releases several loaders, run the last one on the
    /// current task instead of spawning it. Also lets a lone filter batch run
    /// inline. Turning this off spawns every batch.
    pub reuse_current_task: bool,
    /// After each loader returns, check that it wrote every field it
    /// declared and fail the call with `FieldFault::Unwritten` otherwise.
    pub require_all_fields_written: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            reuse_current_task: true,
            require_all_fields_written: true,
        }
    }
}

/// Dependency-driven filter engine over request type `R`.
pub struct Engine<R> {
    graph: Arc<Graph<R>>,
    options: EngineOptions,
    trace_counter: AtomicU64,
}

impl<R> fmt::Debug for Engine<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("graph", &self.graph)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<R> Engine<R>
where
    R: Send + Sync + 'static,
{
    /// Build an engine with default options.
    ///
    /// Fails on duplicate ids, unresolvable fields, duplicate producers,
    /// producing filters and cycles.
    pub fn new(
        loaders: Vec<Arc<dyn Loader<R>>>,
        filters: Vec<Arc<dyn Filter<R>>>,
    ) -> Result<Self, GraphError> {
        Self::with_options(loaders, filters, EngineOptions::default())
    }

    pub fn with_options(
        loaders: Vec<Arc<dyn Loader<R>>>,
        filters: Vec<Arc<dyn Filter<R>>>,
        options: EngineOptions,
    ) -> Result<Self, GraphError> {
        let graph = Graph::build(loaders, filters)?;
        Ok(Self {
            graph: Arc::new(graph),
            options,
            trace_counter: AtomicU64::new(0),
        })
    }

    pub fn graph(&self) -> &Graph<R> {
        &self.graph
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Allocate the next trace id for this engine.
    pub fn next_trace_id(&self) -> TraceId {
        TraceId(self.trace_counter.fetch_add(1, Ordering::Relaxed) + 1)
    }

    /// Evaluate `filter_ids` (all filters when empty) for `request`.
    ///
    /// Returns `Ok(true)` if some filter rejected the request and `Ok(false)`
    /// if every selected filter passed. `store` must be fresh for this call.
    pub async fn execute<S>(
        &self,
        request: Arc<R>,
        store: Arc<FieldStore>,
        filter_ids: &[S],
    ) -> Result<bool, EngineError>
    where
        S: AsRef<str> + Sync,
    {
        let trace_id = self.next_trace_id();
        self.execute_traced(trace_id, request, store, filter_ids)
            .await
    }

    /// Same as [`Engine::execute`] with a caller-chosen trace id.
    pub async fn execute_traced<S>(
        &self,
        trace_id: TraceId,
        request: Arc<R>,
        store: Arc<FieldStore>,
        filter_ids: &[S],
    ) -> Result<bool, EngineError>
    where
        S: AsRef<str> + Sync,
    {
        let targets = self.graph.select(filter_ids)?;
        let span = info_span!("invocation", trace_id = %trace_id);

        executor::execute(
            Arc::clone(&self.graph),
            self.options,
            trace_id,
            request,
            store,
            targets,
        )
        .instrument(span)
        .await
    }
}

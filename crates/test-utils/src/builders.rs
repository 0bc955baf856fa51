//! Synthetic loaders and filters for engine tests.
//!
//! The stubs run against a `u64` request. Every loader checks that each
//! consumed field holds the request value and writes the request value to
//! each produced field; every filter rejects when one of its fields does not
//! hold the request value. Mixing up stores between invocations therefore
//! shows up as a rejection.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use filterdag::dag::Graph;
use filterdag::engine::{Engine, EngineOptions};
use filterdag::errors::{FieldFault, GraphError};
use filterdag::store::FieldStore;
use filterdag::task::{Capability, Filter, LoadFuture, Loader, TaskContext};
use filterdag::types::FieldSet;

use crate::probe::{Probe, ProbeKind};

/// Request type the stubs understand.
pub type StubRequest = u64;

/// What a stub loader does with its produced fields.
#[derive(Debug, Clone, PartialEq, Eq)]
enum WriteMode {
    /// Write the request value.
    Value,
    /// Record a business error instead of a value.
    BusinessError(String),
    /// Write nothing at all.
    Skip,
    /// Write each field twice.
    Twice,
    /// Write one field that was never declared.
    Undeclared(String),
    /// Panic instead of writing.
    Panic,
}

#[derive(Debug, Clone)]
pub struct StubLoader {
    id: String,
    consumes: FieldSet,
    produces: FieldSet,
    delay: Duration,
    mode: WriteMode,
    probe: Option<Probe>,
}

impl StubLoader {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            consumes: FieldSet::new(),
            produces: FieldSet::new(),
            delay: Duration::ZERO,
            mode: WriteMode::Value,
            probe: None,
        }
    }

    pub fn consumes<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.consumes = FieldSet::from(fields);
        self
    }

    pub fn also_consumes(mut self, field: &str) -> Self {
        self.consumes.insert(field);
        self
    }

    pub fn produces<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.produces = FieldSet::from(fields);
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.delay = Duration::from_millis(ms);
        self
    }

    pub fn probe(mut self, probe: &Probe) -> Self {
        self.probe = Some(probe.clone());
        self
    }

    pub fn business_error(mut self, msg: &str) -> Self {
        self.mode = WriteMode::BusinessError(msg.to_string());
        self
    }

    pub fn skip_writes(mut self) -> Self {
        self.mode = WriteMode::Skip;
        self
    }

    pub fn write_twice(mut self) -> Self {
        self.mode = WriteMode::Twice;
        self
    }

    pub fn write_undeclared(mut self, field: &str) -> Self {
        self.mode = WriteMode::Undeclared(field.to_string());
        self
    }

    pub fn panics(mut self) -> Self {
        self.mode = WriteMode::Panic;
        self
    }

    pub fn build(self) -> Arc<dyn Loader<StubRequest>> {
        Arc::new(self)
    }

    fn record(&self, ctx: &TaskContext, kind: ProbeKind) {
        if let Some(probe) = &self.probe {
            probe.record(ctx.trace_id(), &self.id, kind);
        }
    }

    /// `Ok(())` when every consumed field holds `expected`.
    fn check_inputs(&self, store: &FieldStore, expected: u64) -> Result<anyhow::Result<()>, FieldFault> {
        for field in self.consumes.iter() {
            match store.read::<u64>(self, field)? {
                Ok(v) if *v == expected => {}
                Ok(v) => return Ok(Err(anyhow!("field '{field}' holds {v}, expected {expected}"))),
                Err(err) => return Ok(Err(anyhow!("upstream '{field}' failed: {err}"))),
            }
        }
        Ok(Ok(()))
    }
}

impl Capability for StubLoader {
    fn id(&self) -> &str {
        &self.id
    }

    fn consumes(&self) -> FieldSet {
        self.consumes.clone()
    }

    fn produces(&self) -> FieldSet {
        self.produces.clone()
    }
}

impl Loader<StubRequest> for StubLoader {
    fn load<'a>(
        &'a self,
        ctx: &'a TaskContext,
        request: &'a StubRequest,
        store: &'a FieldStore,
    ) -> LoadFuture<'a> {
        Box::pin(async move {
            self.record(ctx, ProbeKind::Started);
            let inputs = self.check_inputs(store, *request)?;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            match &self.mode {
                WriteMode::Value => {
                    for field in self.produces.iter() {
                        let value = match &inputs {
                            Ok(()) => Ok(*request),
                            Err(err) => Err(anyhow!("{err}")),
                        };
                        store.write(self, field, value)?;
                    }
                }
                WriteMode::BusinessError(msg) => {
                    for field in self.produces.iter() {
                        store.write::<u64>(self, field, Err(anyhow!("{msg}")))?;
                    }
                }
                WriteMode::Skip => {}
                WriteMode::Twice => {
                    for field in self.produces.iter() {
                        store.write(self, field, Ok(*request))?;
                        store.write(self, field, Ok(*request))?;
                    }
                }
                WriteMode::Undeclared(field) => {
                    store.write(self, field, Ok(*request))?;
                }
                WriteMode::Panic => panic!("stub loader '{}' panicked on purpose", self.id),
            }

            self.record(ctx, ProbeKind::Finished);
            Ok(())
        })
    }
}

#[derive(Debug, Clone)]
pub struct StubFilter {
    id: String,
    consumes: FieldSet,
    produces: FieldSet,
    verdict: bool,
    reads_undeclared: Option<String>,
    probe: Option<Probe>,
}

impl StubFilter {
    /// A filter that passes.
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            consumes: FieldSet::new(),
            produces: FieldSet::new(),
            verdict: true,
            reads_undeclared: None,
            probe: None,
        }
    }

    pub fn consumes<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.consumes = FieldSet::from(fields);
        self
    }

    /// Add one consumed field to those declared so far.
    pub fn also_consumes(mut self, field: &str) -> Self {
        self.consumes.insert(field);
        self
    }

    /// Declare produced fields, which the graph builder must refuse.
    pub fn produces<const N: usize>(mut self, fields: [&str; N]) -> Self {
        self.produces = FieldSet::from(fields);
        self
    }

    pub fn rejects(mut self) -> Self {
        self.verdict = false;
        self
    }

    pub fn passes_if(mut self, verdict: bool) -> Self {
        self.verdict = verdict;
        self
    }

    pub fn reads_undeclared(mut self, field: &str) -> Self {
        self.reads_undeclared = Some(field.to_string());
        self
    }

    pub fn probe(mut self, probe: &Probe) -> Self {
        self.probe = Some(probe.clone());
        self
    }

    pub fn build(self) -> Arc<dyn Filter<StubRequest>> {
        Arc::new(self)
    }
}

impl Capability for StubFilter {
    fn id(&self) -> &str {
        &self.id
    }

    fn consumes(&self) -> FieldSet {
        self.consumes.clone()
    }

    fn produces(&self) -> FieldSet {
        self.produces.clone()
    }
}

impl Filter<StubRequest> for StubFilter {
    fn filter(
        &self,
        ctx: &TaskContext,
        request: &StubRequest,
        store: &FieldStore,
    ) -> Result<bool, FieldFault> {
        if let Some(probe) = &self.probe {
            probe.record(ctx.trace_id(), &self.id, ProbeKind::Started);
        }

        if let Some(field) = &self.reads_undeclared {
            let _unused = store.read::<u64>(self, field)?;
        }

        let mut inputs_ok = true;
        for field in self.consumes.iter() {
            match store.read::<u64>(self, field)? {
                Ok(v) if *v == *request => {}
                _ => inputs_ok = false,
            }
        }

        if let Some(probe) = &self.probe {
            probe.record(ctx.trace_id(), &self.id, ProbeKind::Finished);
        }
        Ok(inputs_ok && self.verdict)
    }
}

/// Collects stubs and turns them into a graph or an engine.
#[derive(Default)]
pub struct TaskSet {
    loaders: Vec<Arc<dyn Loader<StubRequest>>>,
    filters: Vec<Arc<dyn Filter<StubRequest>>>,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loader(mut self, loader: StubLoader) -> Self {
        self.loaders.push(loader.build());
        self
    }

    pub fn filter(mut self, filter: StubFilter) -> Self {
        self.filters.push(filter.build());
        self
    }

    pub fn graph(self) -> Result<Graph<StubRequest>, GraphError> {
        Graph::build(self.loaders, self.filters)
    }

    pub fn engine(self) -> Result<Engine<StubRequest>, GraphError> {
        Engine::new(self.loaders, self.filters)
    }

    pub fn engine_with(self, options: EngineOptions) -> Result<Engine<StubRequest>, GraphError> {
        Engine::with_options(self.loaders, self.filters, options)
    }

    /// Unwrapping variant for tests that expect a valid task set.
    pub fn build(self) -> Engine<StubRequest> {
        self.engine().expect("stub task set should build")
    }
}

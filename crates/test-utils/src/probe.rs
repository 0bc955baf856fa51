//! Shared recorder of task starts and finishes.

use std::sync::{Arc, Mutex};

use filterdag::types::TraceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeKind {
    Started,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEvent {
    pub trace_id: TraceId,
    pub node: String,
    pub kind: ProbeKind,
}

/// Cheap to clone; every clone appends to the same log.
#[derive(Debug, Clone, Default)]
pub struct Probe {
    events: Arc<Mutex<Vec<ProbeEvent>>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, trace_id: TraceId, node: &str, kind: ProbeKind) {
        self.events.lock().unwrap().push(ProbeEvent {
            trace_id,
            node: node.to_string(),
            kind,
        });
    }

    pub fn events(&self) -> Vec<ProbeEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Ids of every node that started, in start order, across all traces.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == ProbeKind::Started)
            .map(|e| e.node)
            .collect()
    }

    pub fn ran(&self, node: &str) -> bool {
        self.start_count(node) > 0
    }

    pub fn start_count(&self, node: &str) -> usize {
        self.events()
            .iter()
            .filter(|e| e.kind == ProbeKind::Started && e.node == node)
            .count()
    }

    /// Within `trace_id`, whether `first` finished before `second` started.
    /// `false` if either event is missing.
    pub fn finished_before(&self, trace_id: TraceId, first: &str, second: &str) -> bool {
        let events = self.events();
        let position = |node: &str, kind: ProbeKind| {
            events
                .iter()
                .position(|e| e.trace_id == trace_id && e.node == node && e.kind == kind)
        };
        match (position(first, ProbeKind::Finished), position(second, ProbeKind::Started)) {
            (Some(f), Some(s)) => f < s,
            _ => false,
        }
    }

    /// Distinct trace ids seen so far, sorted.
    pub fn traces(&self) -> Vec<TraceId> {
        let mut traces: Vec<TraceId> = self.events().iter().map(|e| e.trace_id).collect();
        traces.sort_unstable();
        traces.dedup();
        traces
    }
}

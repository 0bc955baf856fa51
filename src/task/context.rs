// src/task/context.rs

//! Per-task view of the running invocation.

use tokio::sync::watch;

use crate::types::TraceId;

/// Sending half of an invocation's cancellation flag.
///
/// The executor owns exactly one per invocation and cancels it when the call
/// returns, whatever the outcome. Dropping the handle also counts as
/// cancellation, so a caller that abandons the `execute` future (for example
/// through `tokio::time::timeout`) stops further dispatch as well.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn token(&self) -> CancelToken {
        CancelToken {
            rx: self.tx.subscribe(),
        }
    }

    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancelHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CancelHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// Receiving half of the cancellation flag. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the invocation has been cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // An error means the handle is gone, which also means cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

/// Context handed to every loader and filter.
#[derive(Debug, Clone)]
pub struct TaskContext {
    trace_id: TraceId,
    node_id: String,
    cancel: CancelToken,
}

impl TaskContext {
    pub fn new(trace_id: TraceId, node_id: impl Into<String>, cancel: CancelToken) -> Self {
        Self {
            trace_id,
            node_id: node_id.into(),
            cancel,
        }
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// Id of the task this context was created for.
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Whether the invocation already has its answer. Long-running loaders
    /// may check this (or await [`TaskContext::cancelled`]) to give up early;
    /// the engine itself never interrupts a running task.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await
    }
}

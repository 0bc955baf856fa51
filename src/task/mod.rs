// src/task/mod.rs

//! The contract every pluggable task implements.
//!
//! - [`Capability`] declares which fields a task reads and writes. The graph
//!   builder wires edges from it and the field store enforces it.
//! - [`Loader`] produces fields, possibly after consuming others. Loaders are
//!   async because they usually wait on some upstream lookup.
//! - [`Filter`] is a synchronous leaf that reads fields and decides whether
//!   the request passes.
//!
//! `R` is the request type. The engine never looks inside it; it is handed
//! unchanged to every task of an invocation.

pub mod context;

use std::future::Future;
use std::pin::Pin;

use crate::errors::FieldFault;
use crate::store::FieldStore;
use crate::types::FieldSet;

pub use context::{CancelHandle, CancelToken, TaskContext};

/// Future returned by [`Loader::load`].
pub type LoadFuture<'a> = Pin<Box<dyn Future<Output = Result<(), FieldFault>> + Send + 'a>>;

/// Declared data dependencies of a task.
pub trait Capability: Send + Sync {
    /// Stable, globally unique identifier.
    fn id(&self) -> &str;

    /// Fields this task reads from the store.
    fn consumes(&self) -> FieldSet;

    /// Fields this task writes to the store. Filters keep the default.
    fn produces(&self) -> FieldSet {
        FieldSet::new()
    }
}

/// A task that writes its produced fields into the store.
pub trait Loader<R>: Capability {
    /// Load data and write every declared produced field exactly once.
    ///
    /// A failed lookup is not an `Err` here: record it in the store with
    /// `store.write::<T>(self, field, Err(..))` so consumers can react to it.
    /// `Err` is reserved for store faults, which end the invocation.
    fn load<'a>(
        &'a self,
        ctx: &'a TaskContext,
        request: &'a R,
        store: &'a FieldStore,
    ) -> LoadFuture<'a>;
}

/// A leaf task that accepts (`Ok(true)`) or rejects (`Ok(false)`) the request.
pub trait Filter<R>: Capability {
    fn filter(&self, ctx: &TaskContext, request: &R, store: &FieldStore)
    -> Result<bool, FieldFault>;
}

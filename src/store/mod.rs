// src/store/mod.rs

//! Per-invocation field store.
//!
//! A write-once, capability-checked map from field id to the value (or the
//! business error) a loader produced. Create a fresh [`FieldStore`] for every
//! call to `Engine::execute` and drop it afterwards.

pub mod field_store;

pub use field_store::{FieldStore, LoadError, Loaded};

// src/dag/mod.rs

//! Task graph construction and sub-graph selection.
//!
//! - [`node`] wraps a loader or filter into one schedulable unit.
//! - [`graph`] resolves consumed fields to their producing loader and wires
//!   parent/child edges.
//! - [`validate`] rejects graphs that contain a cycle.
//! - [`select`] computes the minimal set of nodes a request has to run.

pub mod graph;
pub mod node;
pub mod select;
pub mod validate;

pub use graph::Graph;
pub use node::{Node, NodeIndex, NodeKind, TaskHandle};

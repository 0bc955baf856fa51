// src/demo/mod.rs

//! Bundled demo scenario used by the binary.
//!
//! Two loaders and three filters over a user request:
//!
//! ```text
//! user_base_loader ──► user_base ──┬──► name_filter
//!                                  ├──► age_filter
//!                                  └──► user_relation_loader ──► user_relation ──► relation_filter
//! ```
//!
//! The loaders fake their upstream lookups with a configurable delay.

pub mod filters;
pub mod loaders;

use std::sync::Arc;
use std::time::Duration;

use crate::config::DemoSection;
use crate::engine::{Engine, EngineOptions};
use crate::errors::GraphError;
use crate::task::{Filter, Loader};

pub use filters::{AgeFilter, NameFilter, RelationFilter, MIN_AGE};
pub use loaders::{UserBaseLoader, UserRelationLoader};

pub const FIELD_USER_BASE: &str = "user_base";
pub const FIELD_USER_RELATION: &str = "user_relation";

pub const LOADER_USER_BASE: &str = "user_base_loader";
pub const LOADER_USER_RELATION: &str = "user_relation_loader";

pub const FILTER_NAME: &str = "name_filter";
pub const FILTER_AGE: &str = "age_filter";
pub const FILTER_RELATION: &str = "relation_filter";

/// Request evaluated by the demo filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserRequest {
    pub user_id: i64,
    pub anchor_id: i64,
}

/// Value of the `user_base` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserBase {
    pub id: i64,
    pub name: String,
    pub age: u8,
    pub city: String,
}

/// Build the demo engine from the `[demo]` fixtures.
pub fn build_engine(
    demo: &DemoSection,
    options: EngineOptions,
) -> Result<Engine<UserRequest>, GraphError> {
    let delay = Duration::from_millis(demo.load_delay_ms);

    let loaders: Vec<Arc<dyn Loader<UserRequest>>> = vec![
        Arc::new(UserBaseLoader::new(demo.name.clone(), demo.age, delay)),
        Arc::new(UserRelationLoader::new(demo.relation, delay)),
    ];
    let filters: Vec<Arc<dyn Filter<UserRequest>>> = vec![
        Arc::new(NameFilter),
        Arc::new(AgeFilter),
        Arc::new(RelationFilter),
    ];

    Engine::with_options(loaders, filters, options)
}

// src/config/model.rs

use serde::Deserialize;

use crate::engine::EngineOptions;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [engine]
/// reuse_current_task = true
/// require_all_fields_written = true
///
/// [demo]
/// user_id = 10010
/// anchor_id = 10086
/// name = "zhangSan"
/// age = 21
/// relation = 1
/// load_delay_ms = 100
/// filters = ["name_filter", "age_filter", "relation_filter"]
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    /// Executor tunables from `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,

    /// Fixtures for the bundled demo scenario from `[demo]`.
    #[serde(default)]
    pub demo: DemoSection,
}

/// Validated configuration. Only obtainable through `TryFrom<RawConfigFile>`
/// (see `validate.rs`) or [`ConfigFile::default`].
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    pub engine: EngineSection,
    pub demo: DemoSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(engine: EngineSection, demo: DemoSection) -> Self {
        Self { engine, demo }
    }
}

/// `[engine]` section.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct EngineSection {
    /// Run the last released loader on the current task instead of spawning.
    #[serde(default = "default_true")]
    pub reuse_current_task: bool,

    /// Fail an invocation when a loader skips one of its declared fields.
    #[serde(default = "default_true")]
    pub require_all_fields_written: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            reuse_current_task: true,
            require_all_fields_written: true,
        }
    }
}

impl EngineSection {
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            reuse_current_task: self.reuse_current_task,
            require_all_fields_written: self.require_all_fields_written,
        }
    }
}

/// `[demo]` section: what the demo loaders "fetch".
#[derive(Debug, Clone, Deserialize)]
pub struct DemoSection {
    #[serde(default = "default_user_id")]
    pub user_id: i64,

    /// Account the relation loader checks the user against.
    #[serde(default = "default_anchor_id")]
    pub anchor_id: i64,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_age")]
    pub age: u8,

    /// Relation flag returned by the relation loader; `0` passes.
    #[serde(default = "default_relation")]
    pub relation: u8,

    /// Simulated lookup latency for each demo loader.
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Filters to run when none are given on the command line. Empty means
    /// the whole graph.
    #[serde(default = "default_filters")]
    pub filters: Vec<String>,
}

fn default_user_id() -> i64 {
    10010
}

fn default_anchor_id() -> i64 {
    10086
}

fn default_name() -> String {
    "zhangSan".to_string()
}

fn default_age() -> u8 {
    21
}

fn default_relation() -> u8 {
    0
}

fn default_load_delay_ms() -> u64 {
    100
}

fn default_filters() -> Vec<String> {
    Vec::new()
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            anchor_id: default_anchor_id(),
            name: default_name(),
            age: default_age(),
            relation: default_relation(),
            load_delay_ms: default_load_delay_ms(),
            filters: default_filters(),
        }
    }
}

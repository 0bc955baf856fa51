// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{ConfigFile, DemoSection, RawConfigFile};
use crate::errors::{FilterdagError, Result};

/// Upper bound for `[demo].load_delay_ms`.
pub const MAX_LOAD_DELAY_MS: u64 = 60_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = FilterdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_demo(&raw.demo)?;
        Ok(ConfigFile::new_unchecked(raw.engine, raw.demo))
    }
}

fn validate_demo(demo: &DemoSection) -> Result<()> {
    if demo.load_delay_ms > MAX_LOAD_DELAY_MS {
        return Err(FilterdagError::ConfigError(format!(
            "[demo].load_delay_ms must be <= {} (got {})",
            MAX_LOAD_DELAY_MS, demo.load_delay_ms
        )));
    }

    let mut seen = HashSet::new();
    for name in demo.filters.iter() {
        if name.trim().is_empty() {
            return Err(FilterdagError::ConfigError(
                "[demo].filters must not contain empty names".to_string(),
            ));
        }
        if !seen.insert(name.as_str()) {
            return Err(FilterdagError::ConfigError(format!(
                "[demo].filters lists '{}' more than once",
                name
            )));
        }
    }

    Ok(())
}

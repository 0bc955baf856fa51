// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod demo;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod store;
pub mod task;
pub mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{default_config_path, load_and_validate, ConfigFile};
use crate::demo::UserRequest;
use crate::engine::Engine;
use crate::store::FieldStore;

pub use crate::engine::EngineOptions;
pub use crate::errors::{EngineError, FieldFault, GraphError};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the demo engine
/// - `--repeat` concurrent invocations, each with its own field store
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let engine = demo::build_engine(&cfg.demo, cfg.engine.options())?;

    let filters = if args.filters.is_empty() {
        cfg.demo.filters.clone()
    } else {
        args.filters.clone()
    };

    if args.dry_run {
        print_dry_run(&engine, &filters)?;
        return Ok(());
    }

    let request = Arc::new(UserRequest {
        user_id: cfg.demo.user_id,
        anchor_id: cfg.demo.anchor_id,
    });
    let verdicts = run_repeated(Arc::new(engine), request, Arc::new(filters), args.repeat).await?;

    for (run, rejected) in verdicts.iter().enumerate() {
        let verdict = if *rejected { "rejected" } else { "passed" };
        println!("run {run}: {verdict}");
    }
    Ok(())
}

/// Load `path`, or `Filterdag.toml` when present, or fall back to defaults.
fn load_config(path: Option<&str>) -> Result<ConfigFile> {
    match path {
        Some(path) => load_and_validate(path).with_context(|| format!("loading config '{path}'")),
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_and_validate(&default_path)
                    .with_context(|| format!("loading config '{}'", default_path.display()))
            } else {
                debug!(path = %default_path.display(), "no config file; using defaults");
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Run `repeat` invocations concurrently on one engine. Verdicts come back in
/// run order; the first fault aborts the rest.
async fn run_repeated(
    engine: Arc<Engine<UserRequest>>,
    request: Arc<UserRequest>,
    filters: Arc<Vec<String>>,
    repeat: usize,
) -> Result<Vec<bool>> {
    let mut runs = JoinSet::new();
    for run in 0..repeat {
        let engine = Arc::clone(&engine);
        let request = Arc::clone(&request);
        let filters = Arc::clone(&filters);
        runs.spawn(async move {
            let store = Arc::new(FieldStore::new());
            let verdict = engine.execute(request, store, filters.as_slice()).await;
            (run, verdict)
        });
    }

    let mut verdicts = vec![false; repeat];
    while let Some(joined) = runs.join_next().await {
        let (run, verdict) = joined.context("invocation task panicked")?;
        verdicts[run] = verdict.with_context(|| format!("run {run} failed"))?;
    }

    info!(runs = repeat, rejected = verdicts.iter().filter(|r| **r).count(), "all runs finished");
    Ok(verdicts)
}

/// Print every node with its fields and edges, then the nodes the given
/// filters would run.
fn print_dry_run<R>(engine: &Engine<R>, filters: &[String]) -> Result<()>
where
    R: Send + Sync + 'static,
{
    let graph = engine.graph();
    let options = engine.options();

    println!("filterdag dry-run");
    println!("  engine.reuse_current_task = {}", options.reuse_current_task);
    println!(
        "  engine.require_all_fields_written = {}",
        options.require_all_fields_written
    );
    println!();

    println!("nodes ({}):", graph.len());
    for node in graph.nodes() {
        println!("  - {} ({})", node.id(), node.kind());
        if !node.consumes().is_empty() {
            println!("      consumes: {}", node.consumes());
        }
        if !node.produces().is_empty() {
            println!("      produces: {}", node.produces());
        }
        if !node.parents().is_empty() {
            let parents: Vec<&str> = node.parents().iter().map(|&p| graph.node_at(p).id()).collect();
            println!("      after: {parents:?}");
        }
    }
    println!();

    let selected = graph.select(filters)?;
    let ids: Vec<&str> = selected.iter().map(|&i| graph.node_at(i).id()).collect();
    if filters.is_empty() {
        println!("selected (all filters): {ids:?}");
    } else {
        println!("selected for {filters:?}: {ids:?}");
    }

    debug!("dry-run complete (no execution)");
    Ok(())
}

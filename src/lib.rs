// src/lib.rs

pub mod cli;
pub mod clock;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod logging;
pub mod store;
pub mod types;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigFile, load_and_validate};
use crate::dag::{Graph, Step};
use crate::engine::{CoreRuntime, InstanceSummary, Runtime};
use crate::store::{SnapshotStore, open_store};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - snapshot store (restore or fresh construction)
/// - the single-writer runtime
/// - applying `--complete` requests and reporting status
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    if args.dry_run {
        print_dry_run(&cfg)?;
        return Ok(());
    }

    let instance = args
        .instance
        .clone()
        .unwrap_or_else(|| cfg.graph.name.clone());
    let mut store = open_store(&cfg, &config_root_dir(&config_path));

    if args.reset && store.remove(&instance)? {
        info!(instance = %instance, "discarded stored snapshot");
    }

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let core = load_or_create(&cfg, &instance, &mut *store, clock)?;
    let (handle, join) = Runtime::spawn(core, Some(store));

    for id in &args.complete {
        let step = handle
            .complete(id)
            .await
            .with_context(|| format!("completing step '{id}' of instance '{instance}'"))?;
        println!("completed {}", step.completed);
        for ready in &step.newly_ready {
            println!("  now ready: {ready}");
        }
    }

    let summary = handle.summary().await?;
    let next = handle.next_ready_step().await?;

    drop(handle);
    join.await.context("graph runtime task failed")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_status(&summary, next.as_ref());
    }

    Ok(())
}

/// Restore `instance` from the store, or build and persist a fresh one.
fn load_or_create(
    cfg: &ConfigFile,
    instance: &str,
    store: &mut dyn SnapshotStore,
    clock: Arc<dyn Clock>,
) -> Result<CoreRuntime> {
    let defs = cfg.step_defs();

    if let Some(stored) = store.load(instance)? {
        let graph = Graph::restore(stored.steps)
            .with_context(|| format!("stored snapshot for instance '{instance}' is corrupt"))?;

        if !graph.matches_definition(&defs) {
            warn!(instance = %instance, "stored snapshot does not match config");
            bail!(
                "stored snapshot for instance '{instance}' was created from a different step \
                 definition; rerun with --reset to start over"
            );
        }

        let (done, total) = graph.progress();
        info!(instance = %instance, done, total, "restored instance from snapshot");
        return Ok(CoreRuntime::restore(instance, graph, clock, stored.create_time));
    }

    let graph = Graph::new(defs, clock.as_ref())?;
    let steps = graph.len();
    let core = CoreRuntime::new(instance, graph, clock);
    store.save(instance, &core.stored_instance())?;
    info!(instance = %instance, steps, "created new instance");
    Ok(core)
}

/// Snapshot paths are relative to the directory holding the config file.
///
/// - If the config path has a non-empty parent (e.g. "flows/Steps.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Steps.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: graph settings, steps, dependencies and an execution order.
fn print_dry_run(cfg: &ConfigFile) -> Result<()> {
    println!("stepgraph dry-run");
    println!("  graph.name = {}", cfg.graph.name);
    println!("  graph.storage = {:?}", cfg.graph.storage);
    println!("  graph.snapshot_dir = {}", cfg.graph.snapshot_dir);
    println!();

    println!("steps ({}):", cfg.steps.len());
    for step in &cfg.steps {
        println!("  - {}", step.name);
        if let Some(ref description) = step.description {
            println!("      description: {description}");
        }
        if !step.after.is_empty() {
            println!("      after: {:?}", step.after);
        }
    }

    // Timestamps are irrelevant here; nothing is stored.
    let graph = Graph::new(cfg.step_defs(), &SystemClock)?;
    println!();
    println!("execution order: {}", graph.execution_order()?.join(" -> "));

    debug!("dry-run complete (nothing loaded or stored)");
    Ok(())
}

fn print_status(summary: &InstanceSummary, next: Option<&Step>) {
    println!(
        "instance {} [{}] {}/{} done",
        summary.instance, summary.state, summary.done, summary.total
    );

    let width = summary
        .steps
        .iter()
        .map(|s| s.id.len())
        .max()
        .unwrap_or(0)
        .max("STEP".len());

    println!("  {:<width$}  {:<7}  {:<25}  COMPLETED", "STEP", "STATE", "UPDATED");
    for record in &summary.steps {
        let completed = record
            .complete_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<width$}  {:<7}  {:<25}  {}",
            record.id,
            record.state.as_str(),
            record.update_time.to_rfc3339(),
            completed
        );
    }

    match next {
        Some(step) => println!("next ready step: {}", step.id()),
        None if summary.done == summary.total => println!("all steps done"),
        None => println!("no step is ready"),
    }
}

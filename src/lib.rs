// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod graph;
pub mod logging;
pub mod rule;
pub mod types;
pub mod watch;

use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::{CliArgs, Command, MakeArgs};
use crate::config::{build_engine, load_and_validate};
use crate::engine::Engine;
use crate::errors::Result;
use crate::exec::ConsoleReporter;
use crate::fs::RealFileSystem;
use crate::watch::{watch_on_disk, WatchSession};

pub use crate::engine::TargetListing;
pub use crate::errors::{PancakeError, RuleExecutionError};

/// Target name used when none is given on the command line.
pub const DEFAULT_TARGET: &str = "default";

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - working directory and build script loading
/// - engine construction (rules, then matchers)
/// - the requested command: make, dry-run, list or watch
pub async fn run(args: CliArgs) -> Result<()> {
    if let Some(dir) = &args.directory {
        std::env::set_current_dir(dir)?;
        debug!(?dir, "changed working directory");
    }

    let script = load_and_validate(&args.file)?;
    let mut engine = build_engine(&script, Arc::new(RealFileSystem), ".")?;
    info!(script = ?args.file, rules = engine.registry().len(), "build script loaded");

    let make = match &args.command {
        Some(Command::List { all }) => {
            for line in list_lines(&engine, *all) {
                println!("{line}");
            }
            return Ok(());
        }
        Some(command) => command.make_args()?.unwrap_or_default(),
        None => MakeArgs::default(),
    };
    let target = make.target.unwrap_or_else(|| DEFAULT_TARGET.to_string());

    if make.dry_run {
        for line in plan_lines(&mut engine, &target)? {
            println!("{line}");
        }
        return Ok(());
    }

    if make.watch {
        return run_watch(engine, target).await;
    }

    engine.make(&target, &mut ConsoleReporter)?;
    Ok(())
}

async fn run_watch(engine: Engine, target: String) -> Result<()> {
    let root = engine.root().canonicalize()?;
    let session = WatchSession::new(engine, target, ConsoleReporter).with_event_root(root);

    tokio::select! {
        result = watch_on_disk(session) => result,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupted; leaving watch mode");
            Ok(())
        }
    }
}

/// `list` output: one target per line, the default marked with `*`.
pub fn list_lines(engine: &Engine, include_generated: bool) -> Vec<String> {
    engine
        .list_targets(include_generated)
        .into_iter()
        .map(|listing| {
            let marker = if listing.is_default { "*" } else { " " };
            format!("{marker} {}", listing.name)
        })
        .collect()
}

/// Dry-run output: the stale rules of `target`'s closure in execution
/// order, or a single "nothing to do" line.
pub fn plan_lines(engine: &mut Engine, target: &str) -> Result<Vec<String>> {
    let plan = engine.plan(target)?;
    if plan.is_empty() {
        return Ok(vec![format!("nothing to do for {target}")]);
    }
    Ok(plan
        .into_iter()
        .map(|id| {
            let rule = engine.rule(id);
            format!("{} ({})", rule.targets().join(" "), rule.kind())
        })
        .collect())
}


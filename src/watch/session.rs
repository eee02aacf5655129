// src/watch/session.rs

//! Synchronous core of watch mode.
//!
//! [`WatchSession`] owns the engine, the requested target and its current
//! closure, and reacts to one [`FsEvent`] at a time:
//!
//! - `Created`: offer the path to every matcher, then recompute the closure
//!   (new rules may have appeared). Nothing is built.
//! - `Modified`: if the path is owned by a source rule, run the executor
//!   over the current closure. Anything else is ignored.
//!
//! The async shell in [`crate::watch::watcher`] feeds it events; tests can
//! drive it directly.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, trace};

use crate::engine::Engine;
use crate::errors::{PancakeError, Result, RuleExecutionError};
use crate::exec::{Reporter, RunSummary};
use crate::graph::RuleId;
use crate::watch::path_utils::event_target;

/// Filesystem change relevant to watch mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsEvent {
    Created(PathBuf),
    Modified(PathBuf),
}

impl FsEvent {
    pub fn path(&self) -> &Path {
        match self {
            FsEvent::Created(p) | FsEvent::Modified(p) => p,
        }
    }
}

/// What handling an event did.
#[derive(Debug)]
pub enum WatchStep {
    /// Matchers were re-run and the closure recomputed.
    Rescanned { accepted: usize, closure: usize },
    /// The executor ran (possibly with nothing to do).
    Built(RunSummary),
    /// The executor ran and an action failed; the session stays usable.
    BuildFailed(RuleExecutionError),
    /// The event did not concern the build.
    Ignored,
}

pub struct WatchSession<R: Reporter> {
    engine: Engine,
    target: String,
    closure: Vec<RuleId>,
    reporter: R,
    event_root: PathBuf,
}

impl<R: Reporter> std::fmt::Debug for WatchSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("target", &self.target)
            .field("closure", &self.closure.len())
            .finish_non_exhaustive()
    }
}

impl<R: Reporter> WatchSession<R> {
    pub fn new(engine: Engine, target: impl Into<String>, reporter: R) -> Self {
        let event_root = engine.root().to_path_buf();
        Self {
            engine,
            target: target.into(),
            closure: Vec::new(),
            reporter,
            event_root,
        }
    }

    /// Directory absolute event paths are made relative to (defaults to the
    /// engine root).
    pub fn with_event_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.event_root = root.into();
        self
    }

    pub fn event_root(&self) -> &Path {
        &self.event_root
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn closure(&self) -> &[RuleId] {
        &self.closure
    }

    /// Resolve the target and run the initial build.
    pub fn start(&mut self) -> Result<WatchStep> {
        self.closure = self.engine.resolve(&self.target)?;
        self.build()
    }

    /// React to a single filesystem event.
    pub fn handle(&mut self, event: FsEvent) -> Result<WatchStep> {
        let Some(rel) = event_target(&self.event_root, event.path()) else {
            trace!(path = ?event.path(), "event outside the watch root");
            return Ok(WatchStep::Ignored);
        };

        match event {
            FsEvent::Created(_) => {
                let accepted = self.engine.process_created(&rel)?;
                self.closure = self.engine.resolve(&self.target)?;
                debug!(
                    path = %rel,
                    accepted,
                    closure = self.closure.len(),
                    "file created; closure recomputed"
                );
                Ok(WatchStep::Rescanned {
                    accepted,
                    closure: self.closure.len(),
                })
            }
            FsEvent::Modified(_) => {
                let owner = self.engine.registry().get(&rel);
                match owner {
                    Some(id) if self.engine.rule(id).is_source() => {
                        info!(path = %rel, "source changed; rebuilding");
                        self.build()
                    }
                    _ => {
                        trace!(path = %rel, "modified path is not a tracked source");
                        Ok(WatchStep::Ignored)
                    }
                }
            }
        }
    }

    fn build(&mut self) -> Result<WatchStep> {
        match self
            .engine
            .execute(&self.target, &self.closure, &mut self.reporter)
        {
            Ok(summary) => Ok(WatchStep::Built(summary)),
            Err(PancakeError::RuleExecution(failure)) => {
                error!(rule = %failure.label, "build failed; waiting for the next change");
                Ok(WatchStep::BuildFailed(failure))
            }
            Err(other) => Err(other),
        }
    }
}

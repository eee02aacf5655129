// src/exec/executor.rs

//! Runs the stale part of a dependency closure, one rule at a time.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::{Duration, Instant};

use tracing::{error, info};

use crate::errors::{ActionPanic, PancakeError, Result, RuleExecutionError};
use crate::exec::reporter::{Progress, Reporter};
use crate::graph::{Registry, RuleId, StalenessMemo};
use crate::types::RuleKind;

/// What a single executor run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Rules that ran, in order.
    pub executed: Vec<RuleId>,
    pub elapsed: Duration,
}

impl RunSummary {
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty()
    }
}

/// The rules of `closure` that are currently stale, in closure order.
///
/// Staleness is evaluated once for the whole list, before anything runs.
pub fn stale_rules(registry: &mut Registry, closure: &[RuleId]) -> Result<Vec<RuleId>> {
    let mut memo = StalenessMemo::new();
    let mut stale = Vec::new();
    for id in closure {
        if registry.should_memo(*id, &mut memo)? {
            stale.push(*id);
        }
    }
    Ok(stale)
}

/// Filter `closure` to its stale rules and run them in order.
///
/// The first failing action aborts the run.
pub fn execute(
    registry: &mut Registry,
    target: &str,
    closure: &[RuleId],
    reporter: &mut dyn Reporter,
) -> Result<RunSummary> {
    let stale = stale_rules(registry, closure)?;
    if stale.is_empty() {
        info!(requested = %target, "nothing to do");
        reporter.nothing_to_do(target);
        return Ok(RunSummary::default());
    }

    info!(requested = %target, stale = stale.len(), closure = closure.len(), "running stale rules");
    reporter.run_started(target, stale.len());

    let started = Instant::now();
    let total = stale.len();
    let mut summary = RunSummary::default();

    for (i, id) in stale.into_iter().enumerate() {
        let first = registry.rule(id).targets()[0].clone();
        reporter.rule_started(Progress::new(i + 1, total, started.elapsed()), &first);

        if let Err(err) = run_rule(registry, id) {
            if let PancakeError::RuleExecution(failure) = &err {
                error!(rule = %failure.label, error = %failure.source, "rule failed");
                reporter.rule_failed(failure);
            }
            return Err(err);
        }
        summary.executed.push(id);
    }

    summary.elapsed = started.elapsed();
    reporter.run_finished(summary.executed.len(), summary.elapsed);
    Ok(summary)
}

/// Execute one rule regardless of staleness.
///
/// File rules get the parent directories of their targets created first.
/// Source rules never run.
pub fn run_rule(registry: &Registry, id: RuleId) -> Result<()> {
    let rule = registry.rule(id);
    match rule.kind() {
        RuleKind::Source => return Ok(()),
        RuleKind::File => {
            for target in rule.targets() {
                if let Some(parent) = registry.path(target).parent() {
                    registry.fs().create_dir_all(parent)?;
                }
            }
        }
        RuleKind::Phony => {}
    }

    let action = rule.action();
    install_panic_hook();
    CAPTURING.with(|c| c.set(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        action.call(rule.targets(), rule.deps(), registry.root())
    }));
    CAPTURING.with(|c| c.set(false));

    let failure = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(err)) => err,
        Err(payload) => {
            let (location, trace) = PANIC_SITE
                .with(|site| site.borrow_mut().take())
                .unwrap_or_else(|| (None, Backtrace::disabled()));
            anyhow::Error::new(ActionPanic {
                message: panic_message(payload.as_ref()),
                location,
                trace,
            })
        }
    };

    Err(RuleExecutionError::new(rule.label(), rule.targets().to_vec(), failure).into())
}

thread_local! {
    /// Set while an action runs on this thread.
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_SITE: RefCell<Option<(Option<String>, Backtrace)>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook that records where an action panicked. Panics outside
/// actions go to the previous hook unchanged.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info.location().map(ToString::to_string);
                let trace = Backtrace::capture();
                PANIC_SITE.with(|site| *site.borrow_mut() = Some((location, trace)));
            } else {
                previous(info);
            }
        }));
    });
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

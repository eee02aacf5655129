// src/exec/reporter.rs

//! Progress reporting interface for the executor.

use std::time::Duration;

use crate::errors::RuleExecutionError;

/// Position of a rule within the current run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// 1-based index of the rule being started.
    pub index: usize,
    pub total: usize,
    pub elapsed: Duration,
    /// Estimated time left, once at least one rule has finished.
    pub estimate: Option<Duration>,
}

impl Progress {
    pub fn new(index: usize, total: usize, elapsed: Duration) -> Self {
        let done = index.saturating_sub(1);
        let estimate = (done > 0).then(|| {
            let per_rule = elapsed / done as u32;
            per_rule * (total - done) as u32
        });
        Self {
            index,
            total,
            elapsed,
            estimate,
        }
    }
}

/// Receives progress from the executor.
pub trait Reporter {
    /// Nothing in the closure of `target` is stale.
    fn nothing_to_do(&mut self, target: &str);

    fn run_started(&mut self, _target: &str, _total: usize) {}

    /// A rule is about to run. `target` is the rule's first target.
    fn rule_started(&mut self, progress: Progress, target: &str);

    fn rule_failed(&mut self, _error: &RuleExecutionError) {}

    fn run_finished(&mut self, _executed: usize, _elapsed: Duration) {}
}

/// Prints progress to stdout.
#[derive(Debug, Default, Clone)]
pub struct ConsoleReporter;

impl Reporter for ConsoleReporter {
    fn nothing_to_do(&mut self, target: &str) {
        println!("nothing to do for {target}");
    }

    fn rule_started(&mut self, progress: Progress, target: &str) {
        let eta = match progress.estimate {
            Some(eta) => format!(", eta {:.1}s", eta.as_secs_f64()),
            None => String::new(),
        };
        println!(
            "[{}/{}] {:.1}s{eta} => {target}",
            progress.index,
            progress.total,
            progress.elapsed.as_secs_f64()
        );
    }

    fn run_finished(&mut self, executed: usize, elapsed: Duration) {
        println!("made {executed} rule(s) in {:.1}s", elapsed.as_secs_f64());
    }
}

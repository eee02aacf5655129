use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pancake::errors::RuleExecutionError;
use pancake::exec::{Progress, Reporter};
use pancake::fs::FileSystem;
use pancake::rule::{Action, Param};

/// Shared, ordered log of which actions ran.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    runs: Arc<Mutex<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, label: &str) {
        self.runs.lock().unwrap().push(label.to_string());
    }

    /// Everything recorded so far.
    pub fn snapshot(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    /// Everything recorded so far, clearing the log.
    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.runs.lock().unwrap())
    }
}

/// Action that records `label` when it runs.
pub fn recorded_action(recorder: &Recorder, label: &str) -> Action {
    let recorder = recorder.clone();
    let label = label.to_string();
    Action::new(&[], move |_ctx| {
        recorder.push(&label);
        Ok(())
    })
}

/// Action that records `label` and writes every target of its rule to `fs`,
/// the way a real build step would produce its outputs.
pub fn producing_action<F>(recorder: &Recorder, fs: F, label: &str) -> Action
where
    F: FileSystem + 'static,
{
    let recorder = recorder.clone();
    let label = label.to_string();
    Action::new(&[Param::Targets], move |ctx| {
        recorder.push(&label);
        for target in ctx.targets().unwrap_or_default() {
            fs.write(Path::new(target), label.as_bytes())?;
        }
        Ok(())
    })
}

/// One executor callback, as seen by [`RecordingReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    NothingToDo(String),
    RunStarted { target: String, total: usize },
    RuleStarted { index: usize, total: usize, target: String },
    RuleFailed(String),
    RunFinished(usize),
}

/// Reporter that keeps every callback for later assertions.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    pub events: Vec<ReportEvent>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// First targets of the rules that started, in order.
    pub fn started(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                ReportEvent::RuleStarted { target, .. } => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl Reporter for RecordingReporter {
    fn nothing_to_do(&mut self, target: &str) {
        self.events
            .push(ReportEvent::NothingToDo(target.to_string()));
    }

    fn run_started(&mut self, target: &str, total: usize) {
        self.events.push(ReportEvent::RunStarted {
            target: target.to_string(),
            total,
        });
    }

    fn rule_started(&mut self, progress: Progress, target: &str) {
        self.events.push(ReportEvent::RuleStarted {
            index: progress.index,
            total: progress.total,
            target: target.to_string(),
        });
    }

    fn rule_failed(&mut self, error: &RuleExecutionError) {
        self.events.push(ReportEvent::RuleFailed(error.label.clone()));
    }

    fn run_finished(&mut self, executed: usize, _elapsed: Duration) {
        self.events.push(ReportEvent::RunFinished(executed));
    }
}

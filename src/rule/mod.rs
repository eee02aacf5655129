// src/rule/mod.rs

//! Rules: targets, late-bound dependency names and an action.
//!
//! Staleness and execution need the registry (dependencies are names that
//! are only resolved at traversal time), so they live in [`crate::graph`].

pub mod action;

pub use action::{Action, Context, Param};

use crate::types::{RuleKind, RuleOrigin};

/// A unit of buildable work.
#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    /// Display name; phony rules are addressed by it.
    name: Option<String>,
    targets: Vec<String>,
    deps: Vec<String>,
    action: Action,
    origin: RuleOrigin,
}

impl Rule {
    /// Named task producing no artifact. Its only target is its name.
    pub fn phony(name: impl Into<String>, action: Action) -> Self {
        let name = name.into();
        Self {
            kind: RuleKind::Phony,
            targets: vec![name.clone()],
            name: Some(name),
            deps: Vec::new(),
            action,
            origin: RuleOrigin::Script,
        }
    }

    /// Rule producing the given files.
    pub fn file<I, S>(targets: I, action: Action) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            kind: RuleKind::File,
            name: None,
            targets: targets.into_iter().map(Into::into).collect(),
            deps: Vec::new(),
            action,
            origin: RuleOrigin::Script,
        }
    }

    /// Untracked pre-existing input file.
    pub fn source(path: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Source,
            name: None,
            targets: vec![path.into()],
            deps: Vec::new(),
            action: Action::noop(),
            origin: RuleOrigin::Implicit,
        }
    }

    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps.extend(deps.into_iter().map(Into::into));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_origin(mut self, origin: RuleOrigin) -> Self {
        self.origin = origin;
        self
    }

    pub fn kind(&self) -> RuleKind {
        self.kind
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name if it has one, otherwise the first target.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.targets.first().map(String::as_str))
            .unwrap_or("<anonymous>")
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn origin(&self) -> &RuleOrigin {
        &self.origin
    }

    pub fn is_source(&self) -> bool {
        self.kind == RuleKind::Source
    }

    pub(crate) fn push_deps<I>(&mut self, deps: I)
    where
        I: IntoIterator<Item = String>,
    {
        self.deps.extend(deps);
    }
}

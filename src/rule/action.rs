// src/rule/action.rs

//! Rule actions and the execution context they receive.
//!
//! An action declares up front which context fields it consumes (a closed
//! set, see [`Param`]). At execution time the engine builds the full
//! [`Context`] for the rule and hands the action a projection holding only
//! the declared fields; everything else reads as absent.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

/// Context fields an action may declare as inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Param {
    /// First target of the rule.
    Target,
    /// Every target of the rule.
    Targets,
    /// First dependency of the rule, if any.
    Dep,
    /// Every dependency of the rule.
    Deps,
}

impl Param {
    pub const ALL: [Param; 4] = [Param::Target, Param::Targets, Param::Dep, Param::Deps];

    /// Name of the field as it appears in command templates.
    pub fn name(self) -> &'static str {
        match self {
            Param::Target => "target",
            Param::Targets => "targets",
            Param::Dep => "dep",
            Param::Deps => "deps",
        }
    }

    pub fn from_name(name: &str) -> Option<Param> {
        Param::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Per-invocation execution context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    target: Option<String>,
    targets: Option<Vec<String>>,
    dep: Option<String>,
    deps: Option<Vec<String>>,
    params: BTreeMap<String, String>,
    dir: PathBuf,
}

impl Context {
    /// Build the context for a rule, keeping only the fields in `declared`.
    ///
    /// `dir` is the directory the rule's names are relative to.
    pub fn project(
        targets: &[String],
        deps: &[String],
        declared: &[Param],
        params: &BTreeMap<String, String>,
        dir: &Path,
    ) -> Self {
        let wants = |p: Param| declared.contains(&p);
        Self {
            target: wants(Param::Target)
                .then(|| targets.first().cloned())
                .flatten(),
            targets: wants(Param::Targets).then(|| targets.to_vec()),
            dep: wants(Param::Dep).then(|| deps.first().cloned()).flatten(),
            deps: wants(Param::Deps).then(|| deps.to_vec()),
            params: params.clone(),
            dir: dir.to_path_buf(),
        }
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn targets(&self) -> Option<&[String]> {
        self.targets.as_deref()
    }

    pub fn dep(&self) -> Option<&str> {
        self.dep.as_deref()
    }

    pub fn deps(&self) -> Option<&[String]> {
        self.deps.as_deref()
    }

    /// Directory target and dependency names are relative to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A parameter bound into the action with [`Action::bind`].
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Look up a field or bound parameter by its template name.
    ///
    /// List fields are joined with single spaces.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match Param::from_name(name) {
            Some(Param::Target) => self.target.clone(),
            Some(Param::Targets) => self.targets.as_ref().map(|t| t.join(" ")),
            Some(Param::Dep) => self.dep.clone(),
            Some(Param::Deps) => self.deps.as_ref().map(|d| d.join(" ")),
            None => self.params.get(name).cloned(),
        }
    }
}

type ActionFn = Arc<dyn Fn(&Context) -> Result<()> + Send + Sync>;

/// Opaque unit of work attached to a rule.
///
/// An action without a body is *trivial*: a phony rule with a trivial action
/// only runs when one of its dependencies is stale.
#[derive(Clone)]
pub struct Action {
    params: Vec<Param>,
    bound: BTreeMap<String, String>,
    body: Option<ActionFn>,
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("params", &self.params)
            .field("bound", &self.bound)
            .field("trivial", &self.is_trivial())
            .finish()
    }
}

impl Default for Action {
    fn default() -> Self {
        Self::noop()
    }
}

impl Action {
    /// Action that consumes the listed context fields.
    pub fn new<F>(params: &[Param], body: F) -> Self
    where
        F: Fn(&Context) -> Result<()> + Send + Sync + 'static,
    {
        let mut params = params.to_vec();
        params.sort();
        params.dedup();
        Self {
            params,
            bound: BTreeMap::new(),
            body: Some(Arc::new(body)),
        }
    }

    /// Action with an empty body.
    pub fn noop() -> Self {
        Self {
            params: Vec::new(),
            bound: BTreeMap::new(),
            body: None,
        }
    }

    /// Bind a fixed extra parameter, visible through [`Context::param`].
    pub fn bind(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.bound.insert(key.into(), value.into());
        self
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn bound(&self) -> &BTreeMap<String, String> {
        &self.bound
    }

    pub fn is_trivial(&self) -> bool {
        self.body.is_none()
    }

    /// Invoke the action with the declared projection of the rule's context.
    pub fn call(&self, targets: &[String], deps: &[String], dir: &Path) -> Result<()> {
        let Some(body) = &self.body else {
            return Ok(());
        };
        let ctx = Context::project(targets, deps, &self.params, &self.bound, dir);
        body(&ctx)
    }
}

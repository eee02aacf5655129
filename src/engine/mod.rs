// src/engine/mod.rs

//! The build engine: rule registry plus matchers.
//!
//! [`Engine`] is the registration surface a build script talks to (declare
//! rules, attach dependencies, declare matchers) and the entry point for
//! the commands built on top of it (make, dry-run, list). An engine starts
//! empty, is populated while the script loads and is dropped when the
//! command completes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::errors::Result;
use crate::exec::{self, Reporter, RunSummary};
use crate::fs::{FileSystem, RealFileSystem};
use crate::graph::{self, Registry, RuleId};
use crate::rule::{Action, Rule};
use crate::types::{RuleKind, RuleOrigin, TargetConflictPolicy};
use crate::watch::patterns::Matcher;

/// One line of `list` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetListing {
    pub name: String,
    pub kind: RuleKind,
    pub is_default: bool,
    pub generated: bool,
}

#[derive(Debug)]
pub struct Engine {
    registry: Registry,
    matchers: Vec<Matcher>,
}

impl Engine {
    pub fn new(fs: Arc<dyn FileSystem>, policy: TargetConflictPolicy) -> Self {
        Self {
            registry: Registry::new(fs, policy),
            matchers: Vec::new(),
        }
    }

    /// Engine over the real filesystem, rooted at the working directory.
    pub fn on_disk(policy: TargetConflictPolicy) -> Self {
        Self::new(Arc::new(RealFileSystem), policy)
    }

    /// Directory matchers scan and shell commands run in; target names are
    /// relative to it.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.registry.set_root(root);
        self
    }

    pub fn root(&self) -> &Path {
        self.registry.root()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        self.registry.rule(id)
    }

    pub fn add_rule(&mut self, rule: Rule) -> Result<RuleId> {
        self.registry.add_rule(rule)
    }

    /// Declare a named task.
    pub fn phony(&mut self, name: impl Into<String>, action: Action) -> Result<RuleId> {
        self.registry.add_rule(Rule::phony(name, action))
    }

    /// Declare a rule producing `targets`.
    pub fn file<I, S>(&mut self, targets: I, action: Action) -> Result<RuleId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.add_rule(Rule::file(targets, action))
    }

    /// Attach dependency names to the most recently declared rule.
    pub fn deps<I, S>(&mut self, deps: I) -> Result<RuleId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.registry.add_deps_to_last(deps)
    }

    /// Make `rule` depend on all of `other`'s targets; returns `other`.
    pub fn depends_on(&mut self, rule: RuleId, other: RuleId) -> RuleId {
        self.registry.depends_on(rule, other)
    }

    /// Declare a matcher and immediately offer it every existing file.
    pub fn add_matcher(&mut self, mut matcher: Matcher) -> Result<usize> {
        let root = self.registry.root().to_path_buf();
        let accepted = matcher.process_all(&mut self.registry, &root)?;
        debug!(matcher = %matcher.name(), accepted, "matcher registered");
        self.matchers.push(matcher);
        Ok(accepted)
    }

    /// Offer a newly created path to every matcher; returns how many
    /// accepted it.
    pub fn process_created(&mut self, rel_path: &str) -> Result<usize> {
        let mut accepted = 0;
        for matcher in self.matchers.iter_mut() {
            if matcher.process(&mut self.registry, rel_path)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }

    /// Execution-ordered dependency closure of `target`.
    pub fn resolve(&mut self, target: &str) -> Result<Vec<RuleId>> {
        graph::resolve(&mut self.registry, target)
    }

    /// Rules that would run for `target`, without running them.
    pub fn plan(&mut self, target: &str) -> Result<Vec<RuleId>> {
        let closure = self.resolve(target)?;
        exec::stale_rules(&mut self.registry, &closure)
    }

    /// Run the stale part of an already resolved closure.
    pub fn execute(
        &mut self,
        target: &str,
        closure: &[RuleId],
        reporter: &mut dyn Reporter,
    ) -> Result<RunSummary> {
        exec::execute(&mut self.registry, target, closure, reporter)
    }

    /// Resolve and build `target`.
    pub fn make(&mut self, target: &str, reporter: &mut dyn Reporter) -> Result<RunSummary> {
        let closure = self.resolve(target)?;
        self.execute(target, &closure, reporter)
    }

    /// Target name that `"default"` resolves to, if any rule exists.
    pub fn default_target(&self) -> Option<&str> {
        if self.registry.get("default").is_some() {
            return Some("default");
        }
        self.registry.targets().next().map(|(name, _)| name)
    }

    /// Every distinct registered target. Implicit source rules are never
    /// listed; matcher-generated ones only with `include_generated`.
    pub fn list_targets(&self, include_generated: bool) -> Vec<TargetListing> {
        let default = self.default_target();
        self.registry
            .targets()
            .filter_map(|(name, id)| {
                let rule = self.registry.rule(id);
                let generated = match rule.origin() {
                    RuleOrigin::Implicit => return None,
                    RuleOrigin::Matcher(_) => true,
                    RuleOrigin::Script => false,
                };
                if generated && !include_generated {
                    return None;
                }
                Some(TargetListing {
                    name: name.to_string(),
                    kind: rule.kind(),
                    is_default: default == Some(name),
                    generated,
                })
            })
            .collect()
    }
}

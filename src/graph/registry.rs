// src/graph/registry.rs

use std::collections::HashMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::errors::{PancakeError, Result};
use crate::fs::FileSystem;
use crate::rule::Rule;
use crate::types::{RuleOrigin, TargetConflictPolicy};

/// Index of a rule in the registry's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of rules plus the target → owning rule index.
///
/// Dependencies are stored as target names and resolved through
/// [`Registry::lookup`] whenever the graph is traversed, so rules may be
/// registered in any order.
///
/// Target names are relative to the registry root; every filesystem query
/// goes through [`Registry::path`].
pub struct Registry {
    fs: Arc<dyn FileSystem>,
    root: PathBuf,
    policy: TargetConflictPolicy,
    rules: Vec<Rule>,
    owners: HashMap<String, RuleId>,
    /// Target names in first-registration order.
    order: Vec<String>,
    last_declared: Option<RuleId>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("root", &self.root)
            .field("policy", &self.policy)
            .field("rules", &self.rules.len())
            .field("targets", &self.order.len())
            .finish_non_exhaustive()
    }
}

impl Registry {
    pub fn new(fs: Arc<dyn FileSystem>, policy: TargetConflictPolicy) -> Self {
        Self {
            fs,
            root: PathBuf::from("."),
            policy,
            rules: Vec::new(),
            owners: HashMap::new(),
            order: Vec::new(),
            last_declared: None,
        }
    }

    pub fn fs(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Anchor target names at `root` instead of the working directory.
    pub fn set_root(&mut self, root: impl Into<PathBuf>) {
        let root = root.into();
        self.root = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path of a target name. Absolute names are kept as they
    /// are; a root of `.` leaves names untouched.
    pub fn path(&self, target: &str) -> PathBuf {
        if self.root.components().all(|c| c == Component::CurDir) {
            PathBuf::from(target)
        } else {
            self.root.join(target)
        }
    }

    pub fn policy(&self) -> TargetConflictPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    /// Every rule ever registered, in registration order.
    pub fn rules(&self) -> impl Iterator<Item = (RuleId, &Rule)> {
        self.rules.iter().enumerate().map(|(i, r)| (RuleId(i), r))
    }

    /// Every registered target name with its current owner, in
    /// first-registration order.
    pub fn targets(&self) -> impl Iterator<Item = (&str, RuleId)> {
        self.order
            .iter()
            .filter_map(|t| self.owners.get(t).map(|id| (t.as_str(), *id)))
    }

    /// Register a rule and take ownership of every target it declares.
    pub fn add_rule(&mut self, rule: Rule) -> Result<RuleId> {
        if rule.targets().is_empty() {
            return Err(PancakeError::ConfigError(format!(
                "rule '{}' declares no targets",
                rule.label()
            )));
        }

        for target in rule.targets() {
            let Some(owner) = self.owners.get(target) else {
                continue;
            };
            let existing = &self.rules[owner.0];
            if existing.is_source() {
                continue;
            }
            match self.policy {
                TargetConflictPolicy::Error => {
                    return Err(PancakeError::TargetConflict {
                        target: target.clone(),
                        existing: existing.label().to_string(),
                    });
                }
                TargetConflictPolicy::Replace => {
                    warn!(
                        path = %target,
                        previous = %existing.label(),
                        new = %rule.label(),
                        "target ownership moved to a later rule"
                    );
                }
            }
        }

        let id = RuleId(self.rules.len());
        for target in rule.targets() {
            if self.owners.insert(target.clone(), id).is_none() {
                self.order.push(target.clone());
            }
        }
        if *rule.origin() != RuleOrigin::Implicit {
            self.last_declared = Some(id);
        }
        debug!(rule = %rule.label(), kind = %rule.kind(), %id, "registered rule");
        self.rules.push(rule);
        Ok(id)
    }

    /// Current owner of `target`, without materialising anything.
    pub fn get(&self, target: &str) -> Option<RuleId> {
        self.owners.get(target).copied()
    }

    /// Resolve a target name to its rule.
    ///
    /// Falls back to the default rule for `"default"`, then to a freshly
    /// registered source rule for any existing path.
    pub fn lookup(&mut self, target: &str) -> Result<RuleId> {
        if let Some(id) = self.owners.get(target) {
            return Ok(*id);
        }
        if target == "default" {
            return self.default_rule();
        }
        if self.fs.exists(&self.path(target)) {
            debug!(path = %target, "materialising source rule for untracked path");
            return self.add_rule(Rule::source(target));
        }
        Err(PancakeError::NoRule(target.to_string()))
    }

    /// Owner of the first target ever registered.
    pub fn default_rule(&self) -> Result<RuleId> {
        self.targets()
            .next()
            .map(|(_, id)| id)
            .ok_or(PancakeError::NoRules)
    }

    /// Append dependency names to a rule.
    pub fn add_deps<I, S>(&mut self, id: RuleId, deps: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules[id.0].push_deps(deps.into_iter().map(Into::into));
    }

    /// Append dependency names to the most recently declared rule.
    pub fn add_deps_to_last<I, S>(&mut self, deps: I) -> Result<RuleId>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let id = self.last_declared.ok_or_else(|| {
            PancakeError::ConfigError("no rule declared to attach dependencies to".to_string())
        })?;
        self.add_deps(id, deps);
        Ok(id)
    }

    /// Make `rule` depend on every target of `other`; returns `other`.
    pub fn depends_on(&mut self, rule: RuleId, other: RuleId) -> RuleId {
        let targets = self.rules[other.0].targets().to_vec();
        self.rules[rule.0].push_deps(targets);
        other
    }
}

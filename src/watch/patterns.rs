// src/watch/patterns.rs

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::graph::Registry;

/// Callback invoked with the registry and a matching path (relative to the
/// project root, forward slashes). It usually registers a new rule.
pub type MatchCallback = Box<dyn FnMut(&mut Registry, &str) -> Result<()> + Send>;

/// Glob-driven rule generator.
///
/// A path is accepted when it matches `pattern` and no exclusion. Exclusions
/// are tested against both the relative path and the bare file name, so
/// `.DS_Store` excludes it in every directory.
///
/// Each path is handed to the callback at most once per matcher.
pub struct Matcher {
    name: String,
    pattern: String,
    match_set: GlobSet,
    exclude_set: Option<GlobSet>,
    callback: MatchCallback,
    seen: HashSet<String>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.name)
            .field("pattern", &self.pattern)
            .field("seen", &self.seen.len())
            .finish_non_exhaustive()
    }
}

impl Matcher {
    pub fn new(
        name: impl Into<String>,
        pattern: &str,
        excludes: &[String],
        callback: MatchCallback,
    ) -> Result<Self> {
        let name = name.into();
        let match_set = build_globset(&[pattern.to_string()])
            .with_context(|| format!("building pattern globset for matcher {name}"))?;
        let exclude_set = if excludes.is_empty() {
            None
        } else {
            Some(
                build_globset(excludes)
                    .with_context(|| format!("building exclude globset for matcher {name}"))?,
            )
        };

        Ok(Self {
            name,
            pattern: pattern.to_string(),
            match_set,
            exclude_set,
            callback,
            seen: HashSet::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the matcher accepts the given relative path.
    pub fn matches(&self, rel_path: &str) -> bool {
        if !self.match_set.is_match(rel_path) {
            return false;
        }
        if let Some(exclude) = &self.exclude_set {
            let file_name = Path::new(rel_path)
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            if exclude.is_match(rel_path) || exclude.is_match(file_name.as_ref()) {
                return false;
            }
        }
        true
    }

    /// Offer a single path; returns whether the callback ran.
    pub fn process(&mut self, registry: &mut Registry, rel_path: &str) -> Result<bool> {
        if !self.matches(rel_path) || self.seen.contains(rel_path) {
            return Ok(false);
        }
        debug!(matcher = %self.name, path = %rel_path, "matcher accepted path");
        self.seen.insert(rel_path.to_string());
        (self.callback)(registry, rel_path)?;
        Ok(true)
    }

    /// Offer every file under `root`; returns how many were accepted.
    pub fn process_all(&mut self, registry: &mut Registry, root: &Path) -> Result<usize> {
        let fs = registry.fs().clone();
        let mut accepted = 0;
        for rel in walk_files(fs.as_ref(), root)? {
            if self.process(registry, &rel)? {
                accepted += 1;
            }
        }
        Ok(accepted)
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Every file under `root`, relative to it with forward slashes, sorted.
pub fn walk_files(fs: &dyn FileSystem, root: &Path) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                if let Ok(rel) = path.strip_prefix(root) {
                    files.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

// src/graph/staleness.rs

//! Modification times and the "should rebuild?" predicate.
//!
//! Timestamps are read from the filesystem on every call; only the
//! per-query memo of `should` results is kept, and never across actions.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::errors::Result;
use crate::graph::registry::{Registry, RuleId};
use crate::types::RuleKind;

/// Memo of `should` answers for a single query (no actions run in between).
pub type StalenessMemo = HashMap<RuleId, bool>;

impl Registry {
    fn path_mtime(&self, target: &str) -> SystemTime {
        self.fs().modified(&self.path(target)).unwrap_or(UNIX_EPOCH)
    }

    /// Modification time of a rule.
    ///
    /// - file: the oldest of its targets (missing targets count as the epoch)
    /// - phony: now
    /// - source: the file's own timestamp
    pub fn mtime(&self, id: RuleId) -> SystemTime {
        let rule = self.rule(id);
        match rule.kind() {
            RuleKind::Phony => SystemTime::now(),
            RuleKind::Source => rule
                .targets()
                .first()
                .map(|t| self.path_mtime(t))
                .unwrap_or(UNIX_EPOCH),
            RuleKind::File => rule
                .targets()
                .iter()
                .map(|t| self.path_mtime(t))
                .min()
                .unwrap_or(UNIX_EPOCH),
        }
    }

    /// Whether the rule needs to run.
    pub fn should(&mut self, id: RuleId) -> Result<bool> {
        let mut memo = StalenessMemo::new();
        self.should_memo(id, &mut memo)
    }

    pub(crate) fn should_memo(&mut self, id: RuleId, memo: &mut StalenessMemo) -> Result<bool> {
        if let Some(answer) = memo.get(&id) {
            return Ok(*answer);
        }
        // Guards against unbounded recursion on a cyclic graph; the resolver
        // reports the cycle itself.
        memo.insert(id, false);

        let answer = match self.rule(id).kind() {
            RuleKind::Source => false,
            RuleKind::File => self.file_should(id, memo)?,
            RuleKind::Phony => self.phony_should(id, memo)?,
        };
        memo.insert(id, answer);
        Ok(answer)
    }

    /// A file rule is stale if a target is missing, or if any dependency is
    /// stale or newer than the rule's oldest target.
    fn file_should(&mut self, id: RuleId, memo: &mut StalenessMemo) -> Result<bool> {
        let rule = self.rule(id);
        if let Some(missing) = rule
            .targets()
            .iter()
            .find(|t| !self.fs().exists(&self.path(t)))
        {
            trace!(rule = %rule.label(), path = %missing, "target missing");
            return Ok(true);
        }

        let own = self.mtime(id);
        let deps = rule.deps().to_vec();
        for dep in deps {
            let dep_id = self.lookup(&dep)?;
            if self.should_memo(dep_id, memo)? {
                trace!(rule = %self.rule(id).label(), dep = %dep, "dependency is stale");
                return Ok(true);
            }
            if self.mtime(dep_id) > own {
                trace!(rule = %self.rule(id).label(), dep = %dep, "dependency is newer");
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// A phony rule runs if any dependency is stale, or if its action does
    /// anything at all.
    fn phony_should(&mut self, id: RuleId, memo: &mut StalenessMemo) -> Result<bool> {
        let deps = self.rule(id).deps().to_vec();
        for dep in deps {
            let dep_id = self.lookup(&dep)?;
            if self.should_memo(dep_id, memo)? {
                return Ok(true);
            }
        }
        Ok(!self.rule(id).action().is_trivial())
    }
}

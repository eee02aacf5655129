use std::fmt;

use serde::Deserialize;

/// What happens when a rule declares a target that another rule already owns.
///
/// - `Error`: registration fails with a conflict diagnostic (default).
/// - `Replace`: ownership of that single target moves to the new rule; the
///   earlier rule keeps its other targets.
///
/// Implicit source rules are always replaced, whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetConflictPolicy {
    #[default]
    Error,
    Replace,
}

/// The three rule variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Pre-existing input file; never stale, never executed.
    Source,
    /// Produces one or more files.
    File,
    /// Named task with no artifact.
    Phony,
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RuleKind::Source => "source",
            RuleKind::File => "file",
            RuleKind::Phony => "phony",
        };
        f.write_str(s)
    }
}

/// Where a rule came from. Only used for listing and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOrigin {
    /// Declared directly by the build script.
    Script,
    /// Generated by the named matcher.
    Matcher(String),
    /// Materialised on lookup for an existing, untracked path.
    Implicit,
}

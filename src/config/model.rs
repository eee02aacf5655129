// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::TargetConflictPolicy;

/// Build script as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// on_conflict = "error"
///
/// [[rule]]
/// name = "build"
/// deps = ["copy_files", "build/pack.mcmeta"]
///
/// [[rule]]
/// targets = ["build/pack.mcmeta"]
/// cmd = "echo '{title}' > {target}"
/// params = { title = "demo" }
///
/// [[match]]
/// name = "assets"
/// pattern = "assets/**/*"
/// exclude = [".DS_Store", "*.ase"]
/// targets = ["build/{path}"]
/// deps = ["{path}"]
/// cmd = "cp {dep} {target}"
/// required_by = ["copy_files"]
/// ```
///
/// Rules and matchers are arrays so their declaration order survives
/// parsing; the first rule is the fallback default target.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawScriptFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default, rename = "rule")]
    pub rules: Vec<RuleConfig>,

    #[serde(default, rename = "match")]
    pub matchers: Vec<MatchConfig>,
}

/// Validated build script. Construct through `TryFrom<RawScriptFile>`.
#[derive(Debug, Clone)]
pub struct ScriptFile {
    config: ConfigSection,
    rules: Vec<RuleConfig>,
    matchers: Vec<MatchConfig>,
}

impl ScriptFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        rules: Vec<RuleConfig>,
        matchers: Vec<MatchConfig>,
    ) -> Self {
        Self {
            config,
            rules,
            matchers,
        }
    }

    pub fn config(&self) -> &ConfigSection {
        &self.config
    }

    pub fn rules(&self) -> &[RuleConfig] {
        &self.rules
    }

    pub fn matchers(&self) -> &[MatchConfig] {
        &self.matchers
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigSection {
    /// `"error"` (default) or `"replace"`.
    #[serde(default)]
    pub on_conflict: TargetConflictPolicy,
}

/// `[[rule]]` entry.
///
/// Without `targets` it is a phony rule addressed by `name`; with targets
/// it is a file rule and `name` is only a display label.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleConfig {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub deps: Vec<String>,

    /// Shell command; no command means a no-op action.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Fixed extra values for `{placeholders}` in `cmd`.
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Rules (by target name) that get this rule's targets appended to
    /// their dependencies.
    #[serde(default)]
    pub required_by: Vec<String>,
}

impl RuleConfig {
    pub fn is_phony(&self) -> bool {
        self.targets.is_empty()
    }

    /// Name if set, otherwise the first target.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or_else(|| self.targets.first().map(String::as_str))
            .unwrap_or("<unnamed>")
    }
}

/// `[[match]]` entry: generates one file rule per matching path.
///
/// `targets`, `deps` and `optional_deps` are templates over the matched
/// path: `{path}`, `{dir}`, `{file}`, `{stem}`, `{ext}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchConfig {
    pub name: String,

    pub pattern: String,

    #[serde(default)]
    pub exclude: Vec<String>,

    #[serde(default)]
    pub targets: Vec<String>,

    #[serde(default)]
    pub deps: Vec<String>,

    /// Dependencies only attached when the rendered path exists at the time
    /// the rule is generated.
    #[serde(default)]
    pub optional_deps: Vec<String>,

    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[serde(default)]
    pub required_by: Vec<String>,
}

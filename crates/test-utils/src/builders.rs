#![allow(dead_code)]

use std::collections::BTreeMap;

use pancake::config::{ConfigSection, MatchConfig, RawScriptFile, RuleConfig, ScriptFile};
use pancake::errors::Result;
use pancake::types::TargetConflictPolicy;

/// Builder for `ScriptFile` to simplify test setup.
pub struct ScriptBuilder {
    script: RawScriptFile,
}

impl ScriptBuilder {
    pub fn new() -> Self {
        Self {
            script: RawScriptFile {
                config: ConfigSection::default(),
                rules: Vec::new(),
                matchers: Vec::new(),
            },
        }
    }

    pub fn on_conflict(mut self, policy: TargetConflictPolicy) -> Self {
        self.script.config.on_conflict = policy;
        self
    }

    pub fn with_rule(mut self, rule: RuleConfig) -> Self {
        self.script.rules.push(rule);
        self
    }

    pub fn with_matcher(mut self, matcher: MatchConfig) -> Self {
        self.script.matchers.push(matcher);
        self
    }

    pub fn raw(self) -> RawScriptFile {
        self.script
    }

    pub fn try_build(self) -> Result<ScriptFile> {
        ScriptFile::try_from(self.script)
    }

    pub fn build(self) -> ScriptFile {
        self.try_build()
            .expect("Failed to build valid script from builder")
    }
}

impl Default for ScriptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `RuleConfig`.
pub struct RuleBuilder {
    rule: RuleConfig,
}

impl RuleBuilder {
    /// Phony rule addressed by `name`.
    pub fn phony(name: &str) -> Self {
        Self {
            rule: RuleConfig {
                name: Some(name.to_string()),
                ..RuleConfig::default()
            },
        }
    }

    /// File rule producing `targets`.
    pub fn file(targets: &[&str]) -> Self {
        Self {
            rule: RuleConfig {
                targets: targets.iter().map(|t| t.to_string()).collect(),
                ..RuleConfig::default()
            },
        }
    }

    pub fn name(mut self, name: &str) -> Self {
        self.rule.name = Some(name.to_string());
        self
    }

    pub fn deps(mut self, deps: &[&str]) -> Self {
        self.rule.deps.extend(deps.iter().map(|d| d.to_string()));
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.rule.cmd = Some(cmd.to_string());
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.rule.params.insert(key.to_string(), value.to_string());
        self
    }

    pub fn required_by(mut self, names: &[&str]) -> Self {
        self.rule
            .required_by
            .extend(names.iter().map(|n| n.to_string()));
        self
    }

    pub fn build(self) -> RuleConfig {
        self.rule
    }
}

/// Builder for `MatchConfig`.
pub struct MatchBuilder {
    matcher: MatchConfig,
}

impl MatchBuilder {
    pub fn new(name: &str, pattern: &str) -> Self {
        Self {
            matcher: MatchConfig {
                name: name.to_string(),
                pattern: pattern.to_string(),
                exclude: Vec::new(),
                targets: Vec::new(),
                deps: Vec::new(),
                optional_deps: Vec::new(),
                cmd: None,
                params: BTreeMap::new(),
                required_by: Vec::new(),
            },
        }
    }

    pub fn exclude(mut self, pattern: &str) -> Self {
        self.matcher.exclude.push(pattern.to_string());
        self
    }

    pub fn target(mut self, template: &str) -> Self {
        self.matcher.targets.push(template.to_string());
        self
    }

    pub fn dep(mut self, template: &str) -> Self {
        self.matcher.deps.push(template.to_string());
        self
    }

    pub fn optional_dep(mut self, template: &str) -> Self {
        self.matcher.optional_deps.push(template.to_string());
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.matcher.cmd = Some(cmd.to_string());
        self
    }

    pub fn required_by(mut self, name: &str) -> Self {
        self.matcher.required_by.push(name.to_string());
        self
    }

    pub fn build(self) -> MatchConfig {
        self.matcher
    }
}

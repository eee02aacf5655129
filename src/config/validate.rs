// src/config/validate.rs

use std::collections::{BTreeMap, HashMap, HashSet};

use globset::Glob;
use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::config::model::{MatchConfig, RawScriptFile, RuleConfig, ScriptFile};
use crate::errors::{PancakeError, Result};
use crate::exec::command::placeholders;
use crate::rule::Param;

/// Placeholders a matcher template may use, filled from the matched path.
pub const PATH_PLACEHOLDERS: [&str; 5] = ["path", "dir", "file", "stem", "ext"];

impl TryFrom<RawScriptFile> for ScriptFile {
    type Error = PancakeError;

    fn try_from(raw: RawScriptFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_script(&raw)?;
        Ok(ScriptFile::new_unchecked(raw.config, raw.rules, raw.matchers))
    }
}

fn validate_raw_script(script: &RawScriptFile) -> Result<()> {
    validate_rules(&script.rules)?;
    validate_matchers(&script.matchers)?;
    warn_on_static_cycles(&script.rules);
    Ok(())
}

fn validate_rules(rules: &[RuleConfig]) -> Result<()> {
    let mut phony_names = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        if rule.is_phony() {
            let name = match rule.name.as_deref() {
                Some(name) if !name.trim().is_empty() => name,
                Some(_) => {
                    return Err(PancakeError::ConfigError(format!(
                        "rule #{} has an empty name",
                        index + 1
                    )));
                }
                None => {
                    return Err(PancakeError::ConfigError(format!(
                        "rule #{} needs a `name` or at least one entry in `targets`",
                        index + 1
                    )));
                }
            };
            if !phony_names.insert(name) {
                return Err(PancakeError::ConfigError(format!(
                    "rule '{name}' is declared more than once"
                )));
            }
        } else if rule.targets.iter().any(|t| t.trim().is_empty()) {
            return Err(PancakeError::ConfigError(format!(
                "rule '{}' has an empty target",
                rule.label()
            )));
        }

        if rule.deps.iter().any(|d| d.trim().is_empty()) {
            return Err(PancakeError::ConfigError(format!(
                "rule '{}' has an empty dependency",
                rule.label()
            )));
        }

        if let Some(cmd) = &rule.cmd {
            check_placeholders(rule.label(), cmd, &rule.params, &[])?;
        }
    }
    Ok(())
}

fn validate_matchers(matchers: &[MatchConfig]) -> Result<()> {
    for matcher in matchers {
        let name = matcher.name.as_str();
        if name.trim().is_empty() {
            return Err(PancakeError::ConfigError(format!(
                "matcher for pattern '{}' has an empty name",
                matcher.pattern
            )));
        }

        Glob::new(&matcher.pattern)?;
        for pattern in &matcher.exclude {
            Glob::new(pattern)?;
        }

        if matcher.targets.is_empty() {
            return Err(PancakeError::ConfigError(format!(
                "matcher '{name}' needs at least one entry in `targets`"
            )));
        }

        for template in matcher
            .targets
            .iter()
            .chain(&matcher.deps)
            .chain(&matcher.optional_deps)
        {
            for placeholder in placeholders(template) {
                if !PATH_PLACEHOLDERS.contains(&placeholder.as_str()) {
                    return Err(PancakeError::ConfigError(format!(
                        "matcher '{name}': unknown placeholder {{{placeholder}}} in `{template}`"
                    )));
                }
            }
        }

        if let Some(cmd) = &matcher.cmd {
            check_placeholders(name, cmd, &matcher.params, &PATH_PLACEHOLDERS)?;
        }
    }
    Ok(())
}

/// Every placeholder in `cmd` must be a context field, a bound parameter, or
/// one of `extra`.
fn check_placeholders(
    owner: &str,
    cmd: &str,
    params: &BTreeMap<String, String>,
    extra: &[&str],
) -> Result<()> {
    for placeholder in placeholders(cmd) {
        let known = Param::from_name(&placeholder).is_some()
            || params.contains_key(&placeholder)
            || extra.contains(&placeholder.as_str());
        if !known {
            return Err(PancakeError::ConfigError(format!(
                "rule '{owner}': unknown placeholder {{{placeholder}}} in `cmd`"
            )));
        }
    }
    Ok(())
}

/// Log dependency cycles among declared rules.
///
/// Only the declared graph is visible here (matchers and implicit sources
/// come later), so this is advisory; the resolver reports the cycle that
/// actually blocks a build.
fn warn_on_static_cycles(rules: &[RuleConfig]) {
    // Edge direction: rule -> dependency, both keyed by rule index.
    let mut owner: HashMap<&str, usize> = HashMap::new();
    for (index, rule) in rules.iter().enumerate() {
        if rule.is_phony() {
            if let Some(name) = rule.name.as_deref() {
                owner.insert(name, index);
            }
        } else {
            for target in &rule.targets {
                owner.insert(target.as_str(), index);
            }
        }
    }

    let mut graph: DiGraphMap<usize, ()> = DiGraphMap::new();
    for (index, rule) in rules.iter().enumerate() {
        graph.add_node(index);
        for dep in &rule.deps {
            if let Some(&dep_index) = owner.get(dep.as_str()) {
                graph.add_edge(index, dep_index, ());
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.contains_edge(n, n));
        if cyclic {
            let members: Vec<&str> = component.iter().map(|&i| rules[i].label()).collect();
            warn!(rules = ?members, "dependency cycle among declared rules");
        }
    }
}

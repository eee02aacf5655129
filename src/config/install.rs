// src/config/install.rs

//! Turning a validated [`ScriptFile`] into rules and matchers on an
//! [`Engine`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::model::{MatchConfig, RuleConfig, ScriptFile};
use crate::engine::Engine;
use crate::errors::{PancakeError, Result};
use crate::exec::command::{render, shell_action, shell_action_with_paths};
use crate::fs::FileSystem;
use crate::graph::{Registry, RuleId};
use crate::rule::{Action, Rule};
use crate::types::RuleOrigin;
use crate::watch::Matcher;

/// Fresh engine rooted at `root` with everything `script` declares.
pub fn build_engine(
    script: &ScriptFile,
    fs: Arc<dyn FileSystem>,
    root: impl Into<PathBuf>,
) -> Result<Engine> {
    let mut engine = Engine::new(fs, script.config().on_conflict).with_root(root);
    install(script, &mut engine)?;
    Ok(engine)
}

/// Register the script's rules in file order, then its matchers.
pub fn install(script: &ScriptFile, engine: &mut Engine) -> Result<()> {
    let mut declared = Vec::with_capacity(script.rules().len());
    for rule in script.rules() {
        declared.push(engine.add_rule(rule_from_config(rule)?)?);
    }

    // Second pass so `required_by` may name rules declared further down.
    for (rule, id) in script.rules().iter().zip(declared) {
        for name in &rule.required_by {
            let dependant = required_rule(engine.registry(), name)?;
            engine.depends_on(dependant, id);
        }
    }

    for config in script.matchers() {
        let matcher = matcher_from_config(config)?;
        let accepted = engine.add_matcher(matcher)?;
        debug!(matcher = %config.name, accepted, "installed matcher");
    }

    info!(
        rules = script.rules().len(),
        matchers = script.matchers().len(),
        registered = engine.registry().len(),
        "build script installed"
    );
    Ok(())
}

fn rule_from_config(config: &RuleConfig) -> Result<Rule> {
    let action = match &config.cmd {
        Some(cmd) => shell_action(cmd, &config.params)?,
        None => Action::noop(),
    };

    let rule = if config.is_phony() {
        Rule::phony(config.label(), action)
    } else {
        let rule = Rule::file(config.targets.iter().cloned(), action);
        match &config.name {
            Some(name) => rule.with_name(name.clone()),
            None => rule,
        }
    };
    Ok(rule.with_deps(config.deps.iter().cloned()))
}

fn required_rule(registry: &Registry, name: &str) -> Result<RuleId> {
    registry
        .get(name)
        .ok_or_else(|| PancakeError::NoRule(name.to_string()))
}

fn matcher_from_config(config: &MatchConfig) -> Result<Matcher> {
    let template = config.clone();
    Matcher::new(
        config.name.clone(),
        &config.pattern,
        &config.exclude,
        Box::new(move |registry: &mut Registry, path: &str| {
            generate_rule(&template, registry, path)
        }),
    )
}

/// Register the file rule a matcher generates for `path`.
fn generate_rule(config: &MatchConfig, registry: &mut Registry, path: &str) -> Result<()> {
    let expand = |template: &str| expand_path(template, path);

    let targets: Vec<String> = config.targets.iter().map(|t| expand(t)).collect();
    let mut deps: Vec<String> = config.deps.iter().map(|d| expand(d)).collect();
    for optional in &config.optional_deps {
        let dep = expand(optional);
        if registry.fs().exists(&registry.path(&dep)) {
            deps.push(dep);
        }
    }

    let action = match &config.cmd {
        Some(cmd) => shell_action_with_paths(cmd, &config.params, path_fields(path))?,
        None => Action::noop(),
    };

    let rule = Rule::file(targets, action)
        .with_deps(deps)
        .with_origin(RuleOrigin::Matcher(config.name.clone()));
    let id = registry.add_rule(rule)?;

    for name in &config.required_by {
        let dependant = required_rule(registry, name)?;
        registry.depends_on(dependant, id);
    }
    Ok(())
}

/// Fill `{path}`, `{dir}`, `{file}`, `{stem}` and `{ext}` from a matched
/// path. `{dir}` is empty at the root and `{ext}` has no leading dot.
pub fn expand_path(template: &str, path: &str) -> String {
    let fields = path_fields(path);
    render(template, |name| fields.get(name).cloned())
}

fn path_fields(path: &str) -> BTreeMap<String, String> {
    let p = Path::new(path);
    let lossy = |s: Option<&std::ffi::OsStr>| {
        s.map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let dir = p
        .parent()
        .map(|d| d.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();
    BTreeMap::from([
        ("path".to_string(), path.to_string()),
        ("dir".to_string(), dir),
        ("file".to_string(), lossy(p.file_name())),
        ("stem".to_string(), lossy(p.file_stem())),
        ("ext".to_string(), lossy(p.extension())),
    ])
}

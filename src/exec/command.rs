// src/exec/command.rs

//! Shell-command actions and `{placeholder}` templates.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

use anyhow::{anyhow, bail, Context as _};
use regex::Regex;
use tracing::{debug, info};

use crate::errors::{PancakeError, Result};
use crate::rule::{Action, Context, Param};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("placeholder regex is valid")
});

/// Names of every `{placeholder}` in `template`, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in PLACEHOLDER.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Replace every placeholder for which `lookup` has a value; others are
/// left as they are.
pub fn render<F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures<'_>| {
            lookup(&caps[1]).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Build an action running `cmd` through the platform shell.
///
/// The context fields referenced by the template become the action's
/// declared parameters; every other placeholder must be a key of `params`.
pub fn shell_action(cmd: &str, params: &BTreeMap<String, String>) -> Result<Action> {
    shell_action_with_paths(cmd, params, BTreeMap::new())
}

/// [`shell_action`] with extra path-valued placeholders, such as the
/// fields a matcher derives from the path it matched.
///
/// Context fields and `paths` values are shell-quoted word by word when the
/// command line is built; `params` are inserted as written, so one
/// parameter may carry several flags.
pub fn shell_action_with_paths(
    cmd: &str,
    params: &BTreeMap<String, String>,
    paths: BTreeMap<String, String>,
) -> Result<Action> {
    let mut declared = Vec::new();
    for name in placeholders(cmd) {
        match Param::from_name(&name) {
            Some(p) => declared.push(p),
            None if params.contains_key(&name) || paths.contains_key(&name) => {}
            None => {
                return Err(PancakeError::ConfigError(format!(
                    "unknown placeholder {{{name}}} in command `{cmd}`"
                )));
            }
        }
    }

    let template = cmd.to_string();
    let mut action = Action::new(&declared, move |ctx| {
        let line = command_line(&template, ctx, &paths)?;
        run_shell(&line, ctx.dir())
    });
    for (key, value) in params {
        action = action.bind(key.clone(), value.clone());
    }
    Ok(action)
}

/// The command line `template` expands to for `ctx`.
///
/// Quoting follows POSIX `sh`. Absent fields expand to nothing.
pub fn command_line(
    template: &str,
    ctx: &Context,
    paths: &BTreeMap<String, String>,
) -> anyhow::Result<String> {
    let mut line = String::with_capacity(template.len());
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(template) {
        let Some(whole) = caps.get(0) else { continue };
        line.push_str(&template[last..whole.start()]);
        let name = &caps[1];
        let value = match Param::from_name(name) {
            Some(Param::Target) => quote_words(ctx.target())?,
            Some(Param::Dep) => quote_words(ctx.dep())?,
            Some(Param::Targets) => {
                quote_words(ctx.targets().unwrap_or_default().iter().map(String::as_str))?
            }
            Some(Param::Deps) => {
                quote_words(ctx.deps().unwrap_or_default().iter().map(String::as_str))?
            }
            None => match paths.get(name) {
                Some(path) => quote_words([path.as_str()])?,
                None => ctx.param(name).unwrap_or_default().to_string(),
            },
        };
        line.push_str(&value);
        last = whole.end();
    }
    line.push_str(&template[last..]);
    Ok(line)
}

fn quote_words<'a>(words: impl IntoIterator<Item = &'a str>) -> anyhow::Result<String> {
    let mut quoted = Vec::new();
    for word in words {
        let q = shlex::try_quote(word)
            .map_err(|err| anyhow!("cannot quote {word:?} for the shell: {err}"))?;
        quoted.push(q.into_owned());
    }
    Ok(quoted.join(" "))
}

fn run_shell(line: &str, dir: &Path) -> anyhow::Result<()> {
    // Build a shell command appropriate for the platform.
    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    };
    if !dir.as_os_str().is_empty() {
        cmd.current_dir(dir);
    }

    debug!(cmd = %line, ?dir, "spawning shell command");
    let status = cmd
        .status()
        .with_context(|| format!("spawning `{line}`"))?;

    let code = status.code().unwrap_or(-1);
    info!(cmd = %line, exit_code = code, success = status.success(), "shell command exited");
    if !status.success() {
        bail!("command `{line}` exited with status {code}");
    }
    Ok(())
}

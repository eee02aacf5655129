#![allow(dead_code, unused_imports)]

pub use pancake_test_utils::*;

use pancake::engine::Engine;
use pancake::errors::Result;
use pancake::graph::RuleId;

/// Labels of `ids`, in order.
pub fn labels(engine: &Engine, ids: &[RuleId]) -> Vec<String> {
    ids.iter()
        .map(|id| engine.rule(*id).label().to_string())
        .collect()
}

/// Declare a phony rule with a recording action and the given deps.
pub fn recorded_phony(
    engine: &mut Engine,
    recorder: &Recorder,
    name: &str,
    deps: &[&str],
) -> Result<RuleId> {
    let id = engine.phony(name, recorded_action(recorder, name))?;
    engine.registry_mut().add_deps(id, deps.iter().copied());
    Ok(id)
}

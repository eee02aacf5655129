// src/graph/resolver.rs

//! Dependency closure of a target, in execution order.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::errors::{PancakeError, Result};
use crate::graph::registry::{Registry, RuleId};

/// Compute the execution-ordered closure of `target`.
///
/// The order is that of a depth-first walk which moves each visited rule
/// to the end of a sequence before visiting its dependencies, then reverses
/// the sequence: every rule comes after everything it depends on and shared
/// dependencies appear exactly once.
///
/// That walk revisits shared subgraphs once per parent. The same order is
/// the first-visit post-order of the graph with each rule's dependencies
/// taken last to first, so it is computed in two linear passes instead:
/// one resolving names and checking for cycles, one ordering.
///
/// The cycle check is path-sensitive: only a rule already on the current
/// ancestor chain is an error, so diamonds are fine.
pub fn resolve(registry: &mut Registry, target: &str) -> Result<Vec<RuleId>> {
    let mut edges = HashMap::new();
    let mut chain = Vec::new();
    let root = check(registry, target, &mut edges, &mut chain)?;

    let mut order = Vec::with_capacity(edges.len());
    let mut placed = HashSet::with_capacity(edges.len());
    place(root, &edges, &mut placed, &mut order);

    debug!(
        requested = %target,
        closure = ?order.iter().map(|id| registry.rule(*id).label()).collect::<Vec<_>>(),
        "resolved dependency closure"
    );
    Ok(order)
}

/// Resolve `target` and, on first sight, its dependencies in declaration
/// order, recording the resolved edges.
fn check(
    registry: &mut Registry,
    target: &str,
    edges: &mut HashMap<RuleId, Vec<RuleId>>,
    chain: &mut Vec<RuleId>,
) -> Result<RuleId> {
    let id = registry.lookup(target)?;

    if let Some(start) = chain.iter().position(|c| *c == id) {
        let mut cycle: Vec<String> = chain[start..]
            .iter()
            .map(|c| registry.rule(*c).label().to_string())
            .collect();
        cycle.push(registry.rule(id).label().to_string());
        return Err(PancakeError::Cycle(cycle));
    }
    if edges.contains_key(&id) {
        return Ok(id);
    }

    chain.push(id);
    let deps = registry.rule(id).deps().to_vec();
    let mut resolved = Vec::with_capacity(deps.len());
    for dep in &deps {
        resolved.push(check(registry, dep, edges, chain)?);
    }
    chain.pop();
    edges.insert(id, resolved);
    Ok(id)
}

fn place(
    id: RuleId,
    edges: &HashMap<RuleId, Vec<RuleId>>,
    placed: &mut HashSet<RuleId>,
    order: &mut Vec<RuleId>,
) {
    if !placed.insert(id) {
        return;
    }
    if let Some(deps) = edges.get(&id) {
        for dep in deps.iter().rev() {
            place(*dep, edges, placed, order);
        }
    }
    order.push(id);
}

// src/graph/mod.rs

//! The rule graph.
//!
//! - [`registry`] owns every rule and maps target names to their owner.
//! - [`staleness`] implements modification times and the rebuild predicate.
//! - [`resolver`] computes the ordered, cycle-checked dependency closure.

pub mod registry;
pub mod resolver;
pub mod staleness;

pub use registry::{Registry, RuleId};
pub use resolver::resolve;
pub use staleness::StalenessMemo;

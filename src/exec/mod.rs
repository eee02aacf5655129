// src/exec/mod.rs

//! Execution layer.
//!
//! - [`executor`] filters a closure down to its stale rules and runs them
//!   strictly in order.
//! - [`reporter`] is the narrow progress interface the executor talks to.
//! - [`command`] builds actions that run templated shell commands, used by
//!   build scripts loaded from TOML.

pub mod command;
pub mod executor;
pub mod reporter;

pub use executor::{execute, run_rule, stale_rules, RunSummary};
pub use reporter::{ConsoleReporter, Progress, Reporter};

// src/config/mod.rs

//! Build script loading, validation and installation.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a build script from disk (`loader.rs`).
//! - Validate rule shapes, globs and command placeholders (`validate.rs`).
//! - Register the script's rules and matchers on an engine (`install.rs`).

pub mod install;
pub mod loader;
pub mod model;
pub mod validate;

pub use install::{build_engine, expand_path, install};
pub use loader::{load_and_validate, load_from_path, DEFAULT_SCRIPT_FILE};
pub use model::{ConfigSection, MatchConfig, RawScriptFile, RuleConfig, ScriptFile};

// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{RawScriptFile, ScriptFile};
use crate::errors::Result;

/// Load a build script from a given path and return the raw `RawScriptFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawScriptFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let script: RawScriptFile = toml::from_str(&contents)?;

    Ok(script)
}

/// Load a build script from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks rule shapes, glob patterns and command placeholders, and warns
///   about dependency cycles between declared rules.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ScriptFile> {
    let raw = load_from_path(&path)?;
    let script = ScriptFile::try_from(raw)?;
    Ok(script)
}

/// Build script loaded when `-F` is not given, relative to the working
/// directory.
pub const DEFAULT_SCRIPT_FILE: &str = "Pancake.toml";

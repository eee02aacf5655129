// src/watch/path_utils.rs

//! Turning watcher event paths into target names.

use std::path::{Component, Path, PathBuf};

fn to_target(rel: &Path) -> Option<String> {
    let s = rel.to_string_lossy().replace('\\', "/");
    (!s.is_empty()).then_some(s)
}

/// Target name for an event path: relative to `root`, forward slashes.
///
/// Tries a direct `strip_prefix(root)` first, then retries with both paths
/// canonicalised (symlinked prefixes such as `/private/var` on macOS).
/// Returns `None` for the root itself and for paths outside it.
pub fn relative_target(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return to_target(rel);
    }

    let root_canon = root.canonicalize().ok()?;
    // A removed file cannot be canonicalised; its parent usually can.
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };
    let rel = path_canon.strip_prefix(&root_canon).ok()?;
    to_target(rel)
}

/// Target name for a path reported by the watcher (or fed in by a caller).
///
/// Relative paths are taken to be relative to `root` already.
pub fn event_target(root: &Path, path: &Path) -> Option<String> {
    if path.is_relative() {
        let rel: PathBuf = path
            .components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect();
        return to_target(&rel);
    }
    relative_target(root, path)
}

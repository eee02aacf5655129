// src/watch/mod.rs

//! Matchers and watch mode.
//!
//! This module is responsible for:
//! - Compiling matcher glob / exclude patterns and enumerating matching
//!   files (`patterns`).
//! - The reactive watch-mode state machine (`session`).
//! - Wiring a cross-platform filesystem watcher (`notify`) into that state
//!   machine through a tokio channel (`watcher`).

pub mod path_utils;
pub mod patterns;
pub mod session;
pub mod watcher;

pub use patterns::{walk_files, MatchCallback, Matcher};
pub use session::{FsEvent, WatchSession, WatchStep};
pub use watcher::{spawn_watcher, watch, watch_on_disk, WatcherHandle};

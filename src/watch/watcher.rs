// src/watch/watcher.rs

use std::path::PathBuf;

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::errors::Result;
use crate::exec::Reporter;
use crate::fs::RealFileSystem;
use crate::watch::patterns::walk_files;
use crate::watch::session::{FsEvent, WatchSession, WatchStep};

/// Handle for the filesystem watcher.
///
/// This exists mainly so the underlying `RecommendedWatcher` is kept alive for
/// as long as needed. Dropping this handle will stop file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `root` recursively and forward creations and modifications to
/// `events_tx`, in the order notify reports them.
pub fn spawn_watcher(
    root: impl Into<PathBuf>,
    events_tx: mpsc::UnboundedSender<FsEvent>,
) -> Result<WatcherHandle> {
    let root = root.into();
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);

    // Closure called synchronously by notify whenever an event arrives.
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for fs_event in translate(event) {
                    if let Err(err) = events_tx.send(fs_event) {
                        eprintln!("pancake: failed to forward watch event: {err}");
                    }
                }
            }
            Err(err) => {
                eprintln!("pancake: file watch error: {err}");
            }
        },
        Config::default(),
    )?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    info!("file watcher started on {:?}", root);

    Ok(WatcherHandle { _inner: watcher })
}

/// Map a notify event onto the two event kinds watch mode understands.
///
/// A file renamed into place counts as created and then modified, so
/// editors that save by renaming still trigger a rebuild. A created
/// directory is expanded into creations of every file inside it.
pub fn translate(event: Event) -> Vec<FsEvent> {
    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().flat_map(created).collect(),
        EventKind::Modify(ModifyKind::Name(mode)) => {
            let arrived = match mode {
                RenameMode::To => event.paths,
                RenameMode::Both => event.paths.into_iter().last().into_iter().collect(),
                RenameMode::Any | RenameMode::Other => {
                    event.paths.into_iter().filter(|p| p.exists()).collect()
                }
                RenameMode::From => Vec::new(),
            };
            arrived
                .into_iter()
                .flat_map(|p| {
                    let mut events = created(p.clone());
                    if p.is_file() {
                        events.push(FsEvent::Modified(p));
                    }
                    events
                })
                .collect()
        }
        EventKind::Modify(_) => event.paths.into_iter().map(FsEvent::Modified).collect(),
        _ => Vec::new(),
    }
}

fn created(path: PathBuf) -> Vec<FsEvent> {
    if !path.is_dir() {
        return vec![FsEvent::Created(path)];
    }
    match walk_files(&RealFileSystem, &path) {
        Ok(files) => files
            .into_iter()
            .map(|rel| FsEvent::Created(path.join(rel)))
            .collect(),
        Err(err) => {
            eprintln!("pancake: failed to scan created directory {path:?}: {err}");
            Vec::new()
        }
    }
}

/// Run watch mode over an already subscribed event stream: the initial
/// build, then one event at a time until the channel closes.
///
/// Action failures are printed and the loop keeps waiting; any other error
/// ends it.
pub async fn watch<R>(
    session: WatchSession<R>,
    events_rx: mpsc::UnboundedReceiver<FsEvent>,
) -> Result<()>
where
    R: Reporter + Send + 'static,
{
    let (session, step) = blocking_step(session, |s| s.start()).await?;
    report(step);
    event_loop(session, events_rx).await
}

/// Run watch mode on disk: the initial build first, then subscribe to the
/// session's event root and dispatch events until the process is stopped.
pub async fn watch_on_disk<R>(session: WatchSession<R>) -> Result<()>
where
    R: Reporter + Send + 'static,
{
    let (session, step) = blocking_step(session, |s| s.start()).await?;
    report(step);
    let (tx, rx) = mpsc::unbounded_channel();
    let _handle = spawn_watcher(session.event_root().to_path_buf(), tx)?;
    event_loop(session, rx).await
}

async fn event_loop<R>(
    mut session: WatchSession<R>,
    mut events_rx: mpsc::UnboundedReceiver<FsEvent>,
) -> Result<()>
where
    R: Reporter + Send + 'static,
{
    info!(requested = %session.target(), "watching for changes");
    while let Some(event) = events_rx.recv().await {
        debug!(?event, "received watch event");
        let (next, step) = blocking_step(session, move |s| s.handle(event)).await?;
        session = next;
        report(step);
    }
    debug!("watch event channel closed");
    Ok(())
}

/// Run one session step on the blocking pool. Actions are synchronous, so
/// the runtime keeps driving other tasks (signal handling) while they run.
async fn blocking_step<R, F>(
    mut session: WatchSession<R>,
    step: F,
) -> Result<(WatchSession<R>, WatchStep)>
where
    R: Reporter + Send + 'static,
    F: FnOnce(&mut WatchSession<R>) -> Result<WatchStep> + Send + 'static,
{
    let (session, outcome) = tokio::task::spawn_blocking(move || {
        let outcome = step(&mut session);
        (session, outcome)
    })
    .await
    .map_err(anyhow::Error::from)?;
    Ok((session, outcome?))
}

fn report(step: WatchStep) {
    if let WatchStep::BuildFailed(failure) = step {
        for line in failure.detail() {
            eprintln!("{line}");
        }
        error!("waiting for the next change");
    }
}

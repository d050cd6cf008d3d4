//! Content directory watcher with debounced reload

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::content::loader::is_markdown_file;
use crate::error::{IndexError, Result};

/// Default quiet window after the last Markdown event
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Something directories can be registered with, one at a time
pub trait WatchRegistry {
    fn add_dir(&mut self, dir: &Path) -> notify::Result<()>;
}

impl WatchRegistry for RecommendedWatcher {
    fn add_dir(&mut self, dir: &Path) -> notify::Result<()> {
        self.watch(dir, RecursiveMode::NonRecursive)
    }
}

/// Register `root` and every directory below it, breadth first.
///
/// Failing to register `root` itself is an error; failures further down are
/// logged and that directory is skipped.
pub fn register_tree<R: WatchRegistry>(registry: &mut R, root: &Path) -> notify::Result<()> {
    registry.add_dir(root)?;
    tracing::debug!(dir = %root.display(), "Watching directory");

    let mut pending = VecDeque::from([root.to_path_buf()]);
    while let Some(dir) = pending.pop_front() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(dir = %dir.display(), error = %e, "Cannot list directory");
                continue;
            }
        };

        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            if !is_dir {
                continue;
            }
            let path = entry.path();
            match registry.add_dir(&path) {
                Ok(()) => {
                    tracing::debug!(dir = %path.display(), "Watching directory");
                    pending.push_back(path);
                }
                Err(e) => {
                    tracing::warn!(dir = %path.display(), error = %e, "Failed to watch directory");
                }
            }
        }
    }

    Ok(())
}

/// Debounce state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchState {
    Idle,
    Debounced { deadline: Instant },
}

/// Errors after which watching cannot meaningfully continue
fn is_fatal(error: &notify::Error) -> bool {
    matches!(
        error.kind,
        notify::ErrorKind::MaxFilesWatch | notify::ErrorKind::InvalidConfig(_)
    )
}

/// Drive the debounce state machine until the channel closes or a fatal
/// watch error arrives. `on_change` runs once per quiet window.
pub fn event_loop<R, F>(
    events: &Receiver<notify::Result<Event>>,
    registry: &mut R,
    debounce: Duration,
    mut on_change: F,
) where
    R: WatchRegistry,
    F: FnMut(),
{
    let mut state = WatchState::Idle;

    loop {
        let received = match state {
            WatchState::Idle => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
            WatchState::Debounced { deadline } => {
                events.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
        };

        match received {
            Ok(Ok(event)) => {
                if handle_event(&event, registry) {
                    state = WatchState::Debounced {
                        deadline: Instant::now() + debounce,
                    };
                }
            }
            Ok(Err(e)) if is_fatal(&e) => {
                tracing::error!(error = %e, "File watcher failed, hot reload disabled");
                break;
            }
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "File watcher error");
            }
            Err(RecvTimeoutError::Timeout) => {
                state = WatchState::Idle;
                tracing::info!("Content changed, reloading");
                on_change();
            }
            Err(RecvTimeoutError::Disconnected) => {
                tracing::info!("File watcher channel closed");
                break;
            }
        }
    }
}

/// Register new directories and report whether the event should (re)arm
/// the debounce timer
fn handle_event<R: WatchRegistry>(event: &Event, registry: &mut R) -> bool {
    if let EventKind::Create(_) = event.kind {
        for path in event.paths.iter().filter(|p| p.is_dir()) {
            if let Err(e) = register_tree(registry, path) {
                tracing::warn!(dir = %path.display(), error = %e, "Failed to watch new directory");
            }
        }
    }

    // Reading files during a reload produces access events; ignore them
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }

    let changed = event.paths.iter().find(|p| is_markdown_file(p));
    if let Some(path) = changed {
        tracing::debug!(path = %path.display(), kind = ?event.kind, "Markdown file changed");
    }
    changed.is_some()
}

/// Watches a content root and calls back after bursts of Markdown changes
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    root: PathBuf,
    debounce: Duration,
}

impl ChangeWatcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Watch until the watcher fails. Blocks the calling thread.
    pub fn run<F: FnMut()>(self, on_change: F) -> Result<()> {
        let (tx, rx) = channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;

        register_tree(&mut watcher, &self.root).map_err(IndexError::Watch)?;
        tracing::info!(
            root = %self.root.display(),
            debounce_ms = self.debounce.as_millis() as u64,
            "Watching content for changes"
        );

        event_loop(&rx, &mut watcher, self.debounce, on_change);
        Ok(())
    }
}

//! File watching for rebuilds.

use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc as async_mpsc;

/// Events emitted by the file watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// File was created or modified
    Changed(PathBuf),

    /// File was deleted
    Removed(PathBuf),
}

impl WatchEvent {
    /// Path the event refers to.
    pub fn path(&self) -> &Path {
        match self {
            Self::Changed(path) | Self::Removed(path) => path,
        }
    }
}

/// File watcher for detecting source changes.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
}

impl FileWatcher {
    /// Watch `root` recursively, ignoring anything under `ignored`.
    ///
    /// Returns the watcher and a channel to receive events. Bursts of events
    /// closer than the debounce interval are collapsed into the first one.
    pub fn new(
        root: &Path,
        ignored: Vec<PathBuf>,
    ) -> Result<(Self, async_mpsc::Receiver<WatchEvent>), std::io::Error> {
        let (sync_tx, sync_rx) = mpsc::channel();
        let (async_tx, async_rx) = async_mpsc::channel(100);

        let mut watcher = notify::recommended_watcher(move |res: Result<notify::Event, _>| {
            if let Ok(event) = res {
                let _ = sync_tx.send(event);
            }
        })
        .map_err(std::io::Error::other)?;

        watcher
            .watch(root, RecursiveMode::Recursive)
            .map_err(std::io::Error::other)?;

        std::thread::spawn(move || {
            let debounce = Duration::from_millis(100);
            let mut last_sent: Option<Instant> = None;

            while let Ok(event) = sync_rx.recv() {
                for path in event.paths {
                    let Some(watch_event) = classify_event(&path, &event.kind, &ignored) else {
                        continue;
                    };

                    let now = Instant::now();
                    if last_sent.is_some_and(|t| now.duration_since(t) < debounce) {
                        continue;
                    }
                    last_sent = Some(now);

                    if async_tx.blocking_send(watch_event).is_err() {
                        return;
                    }
                }
            }
        });

        Ok((Self { _watcher: watcher }, async_rx))
    }
}

/// Classify a notify event, dropping ignored paths and access events.
fn classify_event(path: &Path, kind: &EventKind, ignored: &[PathBuf]) -> Option<WatchEvent> {
    if ignored.iter().any(|dir| path.starts_with(dir)) {
        return None;
    }

    match kind {
        EventKind::Create(_) | EventKind::Modify(_) => Some(WatchEvent::Changed(path.to_path_buf())),
        EventKind::Remove(_) => Some(WatchEvent::Removed(path.to_path_buf())),
        _ => None,
    }
}

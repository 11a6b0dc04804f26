//! Hot-reload plumbing: a filesystem watcher bridged onto a channel the
//! binary's watch loop drains. The translator core never blocks on this;
//! it lives entirely on notify's worker thread.

use crate::CacheError;
use crossbeam_channel::Receiver;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ShaderWatcher {
    // Held for its Drop; dropping stops the backing thread.
    watcher: RecommendedWatcher,
    events: Receiver<PathBuf>,
}

impl ShaderWatcher {
    pub fn new(paths: &[PathBuf]) -> Result<Self, CacheError> {
        let (tx, events) = crossbeam_channel::unbounded();
        let mut watcher =
            notify::recommended_watcher(move |result: notify::Result<Event>| match result {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                        for path in event.paths {
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(error) => {
                    warn!(target: "watch", %error, "watch_error");
                }
            })?;
        for path in paths {
            watcher.watch(path, RecursiveMode::NonRecursive)?;
            debug!(target: "watch", path = %path.display(), "watching");
        }
        Ok(Self {
            watcher,
            events,
        })
    }

    pub fn watch(&mut self, path: &Path) -> Result<(), CacheError> {
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        Ok(())
    }

    /// The change feed; recv on it from the reload loop.
    pub fn events(&self) -> &Receiver<PathBuf> {
        &self.events
    }
}

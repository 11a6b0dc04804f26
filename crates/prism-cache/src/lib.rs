//! Translation-result caching: the fingerprint, the shared in-memory cache
//! with LFU-with-aging eviction, the file-per-entry disk cache, and the
//! hot-reload watcher the binary's `--watch` mode drains.

mod disk;
mod fingerprint;
mod memory;
mod watch;

pub use disk::{DEFAULT_MAX_AGE, DiskCache, DiskEntry};
pub use fingerprint::Fingerprint;
pub use memory::{DEFAULT_CAPACITY, MemoryCache};
pub use watch::ShaderWatcher;

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cache entry {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("watcher: {0}")]
    Watch(#[from] notify::Error),
}

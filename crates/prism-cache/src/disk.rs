//! File-per-entry disk cache. The file name is the 8-byte hex prefix of
//! the fingerprint; the content is a line-delimited header followed by the
//! translated source bytes.

use crate::{CacheError, Fingerprint};
use prism_catalog::{Stage, Version};
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Entries older than this are eligible for cleanup.
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskEntry {
    pub source_version: Version,
    pub target_version: Version,
    pub stage: Stage,
    pub translated: String,
}

pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(fingerprint.short_hex())
    }

    pub fn store(&self, fingerprint: &Fingerprint, entry: &DiskEntry) -> Result<(), CacheError> {
        let path = self.entry_path(fingerprint);
        let io_err = |source| CacheError::Io {
            path: path.clone(),
            source,
        };
        let mut file = fs::File::create(&path).map_err(io_err)?;
        let header = format!(
            "{}\n{}\n{}\n{}\n",
            entry.source_version.code(),
            entry.target_version.code(),
            entry.stage.ordinal(),
            entry.translated.len()
        );
        file.write_all(header.as_bytes()).map_err(io_err)?;
        file.write_all(entry.translated.as_bytes()).map_err(io_err)?;
        debug!(
            target: "cache",
            file = %path.display(),
            bytes = entry.translated.len(),
            "disk_store"
        );
        Ok(())
    }

    pub fn load(&self, fingerprint: &Fingerprint) -> Result<Option<DiskEntry>, CacheError> {
        let path = self.entry_path(fingerprint);
        let file = match fs::File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };
        let mut reader = BufReader::new(file);
        let source_version = read_header_line(&mut reader, &path)?;
        let target_version = read_header_line(&mut reader, &path)?;
        let stage_ord = read_header_line(&mut reader, &path)?;
        let byte_len = read_header_line(&mut reader, &path)?;

        let malformed = |reason: &str| CacheError::Malformed {
            path: path.clone(),
            reason: reason.to_owned(),
        };
        let source_version = Version::from_code(source_version as u16)
            .ok_or_else(|| malformed("bad source version"))?;
        let target_version = Version::from_code(target_version as u16)
            .ok_or_else(|| malformed("bad target version"))?;
        let stage =
            Stage::from_ordinal(stage_ord as u8).ok_or_else(|| malformed("bad stage ordinal"))?;

        let mut bytes = vec![0u8; byte_len as usize];
        reader
            .read_exact(&mut bytes)
            .map_err(|source| CacheError::Io {
                path: path.clone(),
                source,
            })?;
        let translated =
            String::from_utf8(bytes).map_err(|_| malformed("translated source is not UTF-8"))?;
        Ok(Some(DiskEntry {
            source_version,
            target_version,
            stage,
            translated,
        }))
    }

    /// Remove entries older than `max_age`; returns how many were removed.
    /// Unreadable entries are skipped with a warning rather than failing
    /// the sweep.
    pub fn cleanup(&self, max_age: Duration) -> Result<usize, CacheError> {
        let read_dir = fs::read_dir(&self.dir).map_err(|source| CacheError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let mut removed = 0;
        for dirent in read_dir {
            let Ok(dirent) = dirent else { continue };
            let path = dirent.path();
            let age = entry_age(&path);
            match age {
                Some(age) if age > max_age => {
                    if fs::remove_file(&path).is_ok() {
                        removed += 1;
                    }
                }
                Some(_) => {}
                None => {
                    warn!(target: "cache", file = %path.display(), "cache_entry_unreadable");
                }
            }
        }
        debug!(target: "cache", removed, "disk_cleanup");
        Ok(removed)
    }
}

fn entry_age(path: &Path) -> Option<Duration> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    modified.elapsed().ok()
}

fn read_header_line(
    reader: &mut impl BufRead,
    path: &Path,
) -> Result<u64, CacheError> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|source| CacheError::Io {
            path: path.to_owned(),
            source,
        })?;
    line.trim().parse().map_err(|_| CacheError::Malformed {
        path: path.to_owned(),
        reason: format!("expected numeric header line, got `{}`", line.trim()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(tag: &str) -> Fingerprint {
        Fingerprint::compute(tag, Stage::Fragment, None, Version::V330, 1, false)
    }

    fn entry() -> DiskEntry {
        DiskEntry {
            source_version: Version::V120,
            target_version: Version::V330,
            stage: Stage::Fragment,
            translated: "#version 330 core\nvoid main() {}\n".to_owned(),
        }
    }

    #[test]
    fn store_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        let f = fp("a");
        cache.store(&f, &entry()).unwrap();
        let loaded = cache.load(&f).unwrap().expect("entry expected");
        assert_eq!(loaded, entry());
    }

    #[test]
    fn missing_entry_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        assert!(cache.load(&fp("nope")).unwrap().is_none());
    }

    #[test]
    fn file_name_is_short_hex() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        let f = fp("b");
        cache.store(&f, &entry()).unwrap();
        assert!(dir.path().join(f.short_hex()).exists());
    }

    #[test]
    fn malformed_header_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        let f = fp("c");
        fs::write(dir.path().join(f.short_hex()), "not-a-number\n").unwrap();
        assert!(matches!(
            cache.load(&f),
            Err(CacheError::Malformed { .. })
        ));
    }

    #[test]
    fn cleanup_spares_fresh_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        cache.store(&fp("d"), &entry()).unwrap();
        let removed = cache.cleanup(DEFAULT_MAX_AGE).unwrap();
        assert_eq!(removed, 0);
        assert!(cache.load(&fp("d")).unwrap().is_some());
    }

    #[test]
    fn cleanup_removes_old_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DiskCache::new(dir.path()).unwrap();
        cache.store(&fp("e"), &entry()).unwrap();
        let removed = cache.cleanup(Duration::ZERO).unwrap();
        assert_eq!(removed, 1);
        assert!(cache.load(&fp("e")).unwrap().is_none());
    }
}

//! Disk snapshot persistence for `ExpiringCache`.
//!
//! # Responsibility
//! - Write cache snapshots as JSON to `<dir>/<name>.cache`.
//! - Read snapshots back, classifying absence vs. corruption.
//!
//! # Invariants
//! - Writes are atomic: a temp file in the target directory is persisted
//!   over the final path, so readers never observe a partial snapshot.
//! - Load never mutates the file system.

use super::{CacheError, CacheResult, CacheSnapshot, ExpiringCache};
use crate::clock::Clock;
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hash;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::NamedTempFile;

/// File extension appended to every snapshot name.
pub const SNAPSHOT_EXTENSION: &str = "cache";

/// Returns the snapshot path for `name` inside `dir`.
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.{SNAPSHOT_EXTENSION}"))
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
    V: Clone + Serialize + DeserializeOwned,
{
    /// Atomically writes this cache to `<dir>/<name>.cache`.
    ///
    /// Creates `dir` when missing. Returns the written path.
    ///
    /// # Errors
    /// - `Encode` when the snapshot cannot be serialized.
    /// - `Io` when the directory, temp file, or final rename fails.
    pub fn save_to_disk(&self, name: &str, dir: impl AsRef<Path>) -> CacheResult<PathBuf> {
        let started_at = Instant::now();
        let dir = dir.as_ref();
        let path = snapshot_path(dir, name);

        match write_snapshot(dir, &path, &self.snapshot()) {
            Ok(()) => {
                debug!(
                    "event=cache_save module=cache status=ok entries={} duration_ms={} path={}",
                    self.len(),
                    started_at.elapsed().as_millis(),
                    path.display()
                );
                Ok(path)
            }
            Err(err) => {
                error!(
                    "event=cache_save module=cache status=error duration_ms={} path={} error={}",
                    started_at.elapsed().as_millis(),
                    path.display(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Reads `<dir>/<name>.cache` into a new cache driven by `clock`.
    ///
    /// # Errors
    /// - `Missing` when no snapshot exists (first run).
    /// - `Io` on any other read failure.
    /// - `Corrupt` when the bytes are not a valid snapshot document.
    /// - `InvalidSnapshot` when the document decodes but is unusable.
    pub fn load_from_disk(
        name: &str,
        dir: impl AsRef<Path>,
        clock: Arc<dyn Clock>,
    ) -> CacheResult<Self> {
        let path = snapshot_path(dir.as_ref(), name);
        let bytes = std::fs::read(&path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                CacheError::Missing { path: path.clone() }
            } else {
                CacheError::Io {
                    path: path.clone(),
                    source,
                }
            }
        })?;

        let snapshot: CacheSnapshot<K, V> =
            serde_json::from_slice(&bytes).map_err(|source| CacheError::Corrupt {
                path: path.clone(),
                source,
            })?;
        let cache = Self::from_snapshot(snapshot, clock)?;

        info!(
            "event=cache_load module=cache status=ok entries={} path={}",
            cache.len(),
            path.display()
        );
        Ok(cache)
    }
}

fn write_snapshot<T: Serialize>(dir: &Path, path: &Path, snapshot: &T) -> CacheResult<()> {
    let io_error = |source: std::io::Error| CacheError::Io {
        path: path.to_path_buf(),
        source,
    };

    let bytes = serde_json::to_vec(snapshot).map_err(CacheError::Encode)?;
    std::fs::create_dir_all(dir).map_err(io_error)?;

    let mut temp = NamedTempFile::new_in(dir).map_err(io_error)?;
    temp.write_all(&bytes).map_err(io_error)?;
    temp.as_file().sync_all().map_err(io_error)?;
    temp.persist(path).map_err(|err| io_error(err.error))?;
    Ok(())
}

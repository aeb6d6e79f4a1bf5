//! Typed record store over one expiring cache and one snapshot file.
//!
//! # Responsibility
//! - Bind an `ExpiringCache` to a named snapshot in a fixed directory.
//! - Expose CRUD plus merge-update keyed by the record's own id.
//! - Keep load/save/merge failures non-fatal but observable.
//!
//! # Invariants
//! - Opening never fails: a missing or damaged snapshot yields an empty store.
//! - Mutations are memory-only until `save()`/`try_save()` is called.
//! - A failed merge leaves the stored value unchanged.
//! - Every value is stored under its own `record_id()`.

use crate::cache::disk::snapshot_path;
use crate::cache::{CacheError, ExpiringCache, MergeError, MergeFields, UpdateOptions};
use crate::clock::Clock;
use crate::model::record::{Record, RecordId};
use chrono::Duration;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Display;
use std::hash::Hash;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Value type a `RecordStore` can hold.
pub trait StoreRecord: Clone + Serialize + DeserializeOwned + MergeFields {
    type Id: Clone + Eq + Hash + Display + Serialize + DeserializeOwned;

    fn record_id(&self) -> Self::Id;
}

impl StoreRecord for Record {
    type Id = RecordId;

    fn record_id(&self) -> RecordId {
        self.id.clone()
    }
}

/// How the store's initial contents were obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A snapshot was read successfully.
    Loaded { entries: usize },
    /// No snapshot existed yet.
    Missing,
    /// A snapshot existed but could not be used; the store started empty.
    Recovered { reason: String },
}

/// Failure counters for persistence and merge paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreDiagnostics {
    pub load: LoadOutcome,
    pub failed_saves: u64,
    pub last_save_error: Option<String>,
    pub failed_merges: u64,
    pub last_merge_error: Option<MergeError>,
}

impl StoreDiagnostics {
    fn new(load: LoadOutcome) -> Self {
        Self {
            load,
            failed_saves: 0,
            last_save_error: None,
            failed_merges: 0,
            last_merge_error: None,
        }
    }
}

/// Record store persisted as `<dir>/<filename>.cache`.
pub struct RecordStore<V: StoreRecord> {
    filename: String,
    dir: PathBuf,
    cache: ExpiringCache<V::Id, V>,
    diagnostics: StoreDiagnostics,
}

impl<V: StoreRecord> RecordStore<V> {
    /// Opens the store, loading a prior snapshot when one is usable.
    ///
    /// A loaded snapshot keeps its own stored entry lifetime; `entry_lifetime`
    /// only applies to a freshly created cache.
    pub fn open(
        filename: impl Into<String>,
        dir: impl Into<PathBuf>,
        clock: Arc<dyn Clock>,
        entry_lifetime: Duration,
    ) -> Self {
        let filename = filename.into();
        let dir = dir.into();

        let (cache, load) = match ExpiringCache::load_from_disk(&filename, &dir, Arc::clone(&clock))
        {
            Ok(cache) => {
                let entries = cache.len();
                (cache, LoadOutcome::Loaded { entries })
            }
            Err(err) if err.is_missing() => {
                info!(
                    "event=store_open module=store status=fallback reason=missing store={}",
                    filename
                );
                (
                    ExpiringCache::with_clock(clock, entry_lifetime),
                    LoadOutcome::Missing,
                )
            }
            Err(err) => {
                warn!(
                    "event=store_open module=store status=fallback reason=unreadable store={} error={}",
                    filename, err
                );
                (
                    ExpiringCache::with_clock(clock, entry_lifetime),
                    LoadOutcome::Recovered {
                        reason: err.to_string(),
                    },
                )
            }
        };

        Self {
            filename,
            dir,
            cache,
            diagnostics: StoreDiagnostics::new(load),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of the backing snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        snapshot_path(&self.dir, &self.filename)
    }

    pub fn diagnostics(&self) -> &StoreDiagnostics {
        &self.diagnostics
    }

    /// Inserts or replaces `value` under its own id.
    pub fn insert(&mut self, value: V) {
        let id = value.record_id();
        self.cache.insert(value, id);
    }

    /// Inserts each value in order; later duplicates replace earlier ones.
    pub fn insert_all(&mut self, values: impl IntoIterator<Item = V>) {
        for value in values {
            self.insert(value);
        }
    }

    /// Merges `value` into the record stored under `key`.
    ///
    /// `key` must be the value's own id; a mismatch is rejected like any
    /// other merge failure. Merge failures are logged and counted in
    /// `diagnostics()`; the stored value is kept.
    pub fn update(&mut self, value: V, key: V::Id, options: UpdateOptions) {
        let key_label = key.to_string();
        let result = if value.record_id() == key {
            self.cache.merge_update(value, key, options)
        } else {
            Err(MergeError::IdentityMismatch {
                existing: key_label.clone(),
                incoming: value.record_id().to_string(),
            })
        };
        if let Err(err) = result {
            warn!(
                "event=store_update module=store status=error store={} id={} error={}",
                self.filename, key_label, err
            );
            self.diagnostics.failed_merges += 1;
            self.diagnostics.last_merge_error = Some(err);
        }
    }

    /// Fresh value for `id`; an expired record is evicted.
    pub fn value(&mut self, id: &V::Id) -> Option<V> {
        self.cache.value(id)
    }

    /// Every stored value, without expiration filtering.
    pub fn values(&self) -> Vec<V> {
        self.cache.all_values()
    }

    pub fn remove(&mut self, id: &V::Id) {
        self.cache.remove(id);
    }

    pub fn remove_all(&mut self) {
        self.cache.remove_all();
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Writes the current state to disk and reports the outcome.
    pub fn try_save(&self) -> Result<PathBuf, CacheError> {
        self.cache.save_to_disk(&self.filename, &self.dir)
    }

    /// Best-effort persistence: failures are logged and counted, never
    /// returned.
    pub fn save(&mut self) {
        if let Err(err) = self.try_save() {
            warn!(
                "event=store_save module=store status=error store={} error={}",
                self.filename, err
            );
            self.diagnostics.failed_saves += 1;
            self.diagnostics.last_save_error = Some(err.to_string());
        }
    }
}

//! Generic in-memory key/value cache with per-entry expiration.
//!
//! # Responsibility
//! - Store values keyed by `K`, each stamped with an expiration instant.
//! - Convert to/from a serializable snapshot for disk persistence.
//! - Apply field-level merge updates through `MergeFields`.
//!
//! # Invariants
//! - A value is visible through `value()` only while `now < expiration_date`.
//! - Expired entries are evicted lazily by `value()` for that exact key;
//!   there is no background sweep.
//! - `all_values()` never filters or evicts.
//! - Snapshots keep expired entries verbatim; expiration is checked on read.

pub mod disk;
pub mod merge;

pub use merge::{merge_option, merge_scalar, merge_vec, MergeError, MergeFields, UpdateOptions};

use crate::clock::{system_clock, Clock};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;

/// Entry lifetime used when none is configured: 24 hours.
pub const DEFAULT_ENTRY_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Returns the default entry lifetime.
pub fn default_entry_lifetime() -> Duration {
    Duration::seconds(DEFAULT_ENTRY_LIFETIME_SECS)
}

/// One cached value with its expiration instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry<K, V> {
    pub key: K,
    pub value: V,
    pub expiration_date: DateTime<Utc>,
}

/// Serialized form of a cache.
///
/// Wire shape: `{"entryLifetime": <seconds>, "entries": [{"key", "value",
/// "expirationDate"}]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot<K, V> {
    /// Entry lifetime in (fractional) seconds.
    pub entry_lifetime: f64,
    pub entries: Vec<Entry<K, V>>,
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Snapshot persistence errors.
///
/// `Missing` is kept apart from the other variants so callers can tell a
/// first run from a damaged snapshot.
#[derive(Debug)]
pub enum CacheError {
    Missing {
        path: PathBuf,
    },
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
    Encode(serde_json::Error),
    InvalidSnapshot(String),
}

impl CacheError {
    /// Whether the snapshot simply does not exist yet.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }
}

impl Display for CacheError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { path } => write!(f, "cache snapshot not found: {}", path.display()),
            Self::Io { path, source } => {
                write!(f, "cache snapshot I/O failed at {}: {source}", path.display())
            }
            Self::Corrupt { path, source } => {
                write!(f, "cache snapshot at {} is corrupt: {source}", path.display())
            }
            Self::Encode(err) => write!(f, "failed to encode cache snapshot: {err}"),
            Self::InvalidSnapshot(message) => write!(f, "invalid cache snapshot: {message}"),
        }
    }
}

impl Error for CacheError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Corrupt { source, .. } => Some(source),
            Self::Encode(err) => Some(err),
            Self::Missing { .. } | Self::InvalidSnapshot(_) => None,
        }
    }
}

/// Expiring key/value cache.
#[derive(Debug, Clone)]
pub struct ExpiringCache<K, V> {
    entries: HashMap<K, Entry<K, V>>,
    clock: Arc<dyn Clock>,
    entry_lifetime: Duration,
}

impl<K, V> Default for ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ExpiringCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty cache on the system clock with the default lifetime.
    pub fn new() -> Self {
        Self::with_clock(system_clock(), default_entry_lifetime())
    }

    /// Creates an empty cache on the system clock.
    pub fn with_lifetime(entry_lifetime: Duration) -> Self {
        Self::with_clock(system_clock(), entry_lifetime)
    }

    /// Creates an empty cache driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>, entry_lifetime: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            clock,
            entry_lifetime,
        }
    }

    pub fn entry_lifetime(&self) -> Duration {
        self.entry_lifetime
    }

    pub fn clock(&self) -> Arc<dyn Clock> {
        Arc::clone(&self.clock)
    }

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// Expiration is `now + entry_lifetime`, clamped to the latest
    /// representable instant.
    pub fn insert(&mut self, value: V, key: K) {
        let expiration_date = self
            .clock
            .now()
            .checked_add_signed(self.entry_lifetime)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(
            key.clone(),
            Entry {
                key,
                value,
                expiration_date,
            },
        );
    }

    /// Returns the value for `key` while it is fresh.
    ///
    /// An expired entry is evicted and reported as absent.
    pub fn value(&mut self, key: &K) -> Option<V> {
        let expiration_date = self.entries.get(key)?.expiration_date;
        if self.clock.now() < expiration_date {
            return self.entries.get(key).map(|entry| entry.value.clone());
        }

        self.entries.remove(key);
        None
    }

    /// Returns every stored value, fresh or not, in unspecified order.
    pub fn all_values(&self) -> Vec<V> {
        self.entries
            .values()
            .map(|entry| entry.value.clone())
            .collect()
    }

    /// Assignment-style write: `None` removes `key`, `Some` inserts.
    pub fn set(&mut self, key: K, value: Option<V>) {
        match value {
            Some(value) => self.insert(value, key),
            None => self.remove(&key),
        }
    }

    pub fn remove(&mut self, key: &K) {
        self.entries.remove(key);
    }

    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Captures the serializable state of this cache.
    pub fn snapshot(&self) -> CacheSnapshot<K, V> {
        CacheSnapshot {
            entry_lifetime: duration_to_secs(self.entry_lifetime),
            entries: self.entries.values().cloned().collect(),
        }
    }

    /// Rebuilds a cache from a snapshot, keeping stored expiration instants.
    ///
    /// # Errors
    /// - `InvalidSnapshot` when the lifetime is negative, non-finite or out
    ///   of range.
    pub fn from_snapshot(
        snapshot: CacheSnapshot<K, V>,
        clock: Arc<dyn Clock>,
    ) -> CacheResult<Self> {
        let entry_lifetime = secs_to_duration(snapshot.entry_lifetime)?;
        let mut cache = Self::with_clock(clock, entry_lifetime);
        for entry in snapshot.entries {
            cache.entries.insert(entry.key.clone(), entry);
        }
        Ok(cache)
    }

    /// Merges `value` into the fresh value stored under `key`.
    ///
    /// Without a fresh existing value this is a plain `insert`. On error the
    /// stored value is left untouched.
    pub fn merge_update(
        &mut self,
        value: V,
        key: K,
        options: UpdateOptions,
    ) -> Result<(), MergeError>
    where
        V: MergeFields,
    {
        let Some(existing) = self.value(&key) else {
            self.insert(value, key);
            return Ok(());
        };

        let merged = existing.merge_fields(&value, options)?;
        self.insert(merged, key);
        Ok(())
    }
}

const MICROS_PER_SEC: f64 = 1_000_000.0;

fn duration_to_secs(duration: Duration) -> f64 {
    match duration.num_microseconds() {
        Some(micros) => micros as f64 / MICROS_PER_SEC,
        None => duration.num_milliseconds() as f64 / 1000.0,
    }
}

fn secs_to_duration(secs: f64) -> CacheResult<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(CacheError::InvalidSnapshot(format!(
            "entryLifetime must be a finite, non-negative number of seconds, got {secs}"
        )));
    }
    let micros = (secs * MICROS_PER_SEC).round();
    if micros >= i64::MAX as f64 {
        return Err(CacheError::InvalidSnapshot(format!(
            "entryLifetime {secs} is out of range"
        )));
    }
    Ok(Duration::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::{CacheSnapshot, ExpiringCache};
    use crate::clock::{Clock, ManualClock};
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn cache_at_noon() -> (ManualClock, ExpiringCache<String, u32>) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap());
        let cache = ExpiringCache::with_clock(Arc::new(clock.clone()), Duration::hours(1));
        (clock, cache)
    }

    #[test]
    fn value_is_visible_until_expiration_instant() {
        let (clock, mut cache) = cache_at_noon();
        cache.insert(7, "a".to_string());

        clock.advance(Duration::minutes(59));
        assert_eq!(cache.value(&"a".to_string()), Some(7));

        clock.advance(Duration::minutes(1));
        assert_eq!(cache.value(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn all_values_does_not_evict_expired_entries() {
        let (clock, mut cache) = cache_at_noon();
        cache.insert(1, "a".to_string());
        clock.advance(Duration::hours(2));

        assert_eq!(cache.all_values(), vec![1]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn set_none_removes_key() {
        let (_clock, mut cache) = cache_at_noon();
        cache.set("a".to_string(), Some(3));
        assert_eq!(cache.value(&"a".to_string()), Some(3));

        cache.set("a".to_string(), None);
        assert_eq!(cache.value(&"a".to_string()), None);
    }

    #[test]
    fn reinsert_refreshes_expiration() {
        let (clock, mut cache) = cache_at_noon();
        cache.insert(1, "a".to_string());
        clock.advance(Duration::minutes(45));
        cache.insert(2, "a".to_string());
        clock.advance(Duration::minutes(45));

        assert_eq!(cache.value(&"a".to_string()), Some(2));
    }

    #[test]
    fn from_snapshot_rejects_negative_lifetime() {
        let snapshot: CacheSnapshot<String, u32> = CacheSnapshot {
            entry_lifetime: -1.0,
            entries: Vec::new(),
        };
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let err = ExpiringCache::from_snapshot(snapshot, clock).unwrap_err();
        assert!(err.to_string().contains("entryLifetime"));
    }

    #[test]
    fn sub_millisecond_lifetime_survives_snapshot() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let lifetime = Duration::microseconds(1_500);
        let cache: ExpiringCache<String, u32> = ExpiringCache::with_clock(clock, lifetime);

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.entry_lifetime, 0.0015);

        let restored = ExpiringCache::from_snapshot(snapshot, cache.clock()).unwrap();
        assert_eq!(restored.entry_lifetime(), lifetime);
    }

    #[test]
    fn from_snapshot_rejects_out_of_range_lifetime() {
        let snapshot: CacheSnapshot<String, u32> = CacheSnapshot {
            entry_lifetime: 1e300,
            entries: Vec::new(),
        };
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        assert!(ExpiringCache::from_snapshot(snapshot, clock).is_err());
    }

    #[test]
    fn snapshot_keeps_expired_entries_until_read() {
        let (clock, mut cache) = cache_at_noon();
        cache.insert(9, "old".to_string());
        clock.advance(Duration::hours(3));

        let snapshot = cache.snapshot();
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.entry_lifetime, 3600.0);

        let mut restored = ExpiringCache::from_snapshot(snapshot, cache.clock()).unwrap();
        assert_eq!(restored.all_values(), vec![9]);
        assert_eq!(restored.value(&"old".to_string()), None);
    }
}

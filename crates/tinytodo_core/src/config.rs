//! Journal configuration.
//!
//! # Responsibility
//! - Resolve where category snapshots live and how long entries stay fresh.
//! - Apply environment overrides without failing on bad input.
//!
//! # Invariants
//! - `entry_lifetime` is always positive.
//! - Invalid environment values are ignored with a warning, never fatal.

use crate::cache::default_entry_lifetime;
use crate::journal::category::Category;
use chrono::Duration;
use log::warn;
use std::path::PathBuf;

/// Overrides the snapshot directory.
pub const STORE_DIR_ENV: &str = "TINYTODO_STORE_DIR";
/// Overrides the entry lifetime, in seconds.
pub const ENTRY_LIFETIME_ENV: &str = "TINYTODO_ENTRY_LIFETIME_SECS";

const STORE_DIR_NAME: &str = "tinytodo";

/// Settings used by `PartitionedJournal::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalConfig {
    /// Directory holding `<category>.cache` snapshots.
    pub store_dir: PathBuf,
    /// Lifetime applied to entries of stores created without a snapshot.
    pub entry_lifetime: Duration,
    /// Whether `clear_data()` writes the empty state to disk.
    pub persist_on_clear: bool,
    /// Category selected when the journal opens.
    pub initial_category: Category,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            entry_lifetime: default_entry_lifetime(),
            persist_on_clear: true,
            initial_category: Category::default(),
        }
    }
}

impl JournalConfig {
    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(
            std::env::var(STORE_DIR_ENV).ok().as_deref(),
            std::env::var(ENTRY_LIFETIME_ENV).ok().as_deref(),
        )
    }

    pub fn with_store_dir(mut self, store_dir: impl Into<PathBuf>) -> Self {
        self.store_dir = store_dir.into();
        self
    }

    fn with_overrides(mut self, store_dir: Option<&str>, lifetime_secs: Option<&str>) -> Self {
        if let Some(raw) = store_dir {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.store_dir = PathBuf::from(trimmed);
            }
        }

        if let Some(raw) = lifetime_secs {
            match parse_lifetime_secs(raw) {
                Some(lifetime) => self.entry_lifetime = lifetime,
                None => warn!(
                    "event=config_override module=config status=ignored key={} value={}",
                    ENTRY_LIFETIME_ENV,
                    raw.trim()
                ),
            }
        }

        self
    }
}

/// Platform cache directory, falling back to the temp directory.
pub fn default_store_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(STORE_DIR_NAME)
}

fn parse_lifetime_secs(raw: &str) -> Option<Duration> {
    let secs = raw.trim().parse::<f64>().ok()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Duration::try_milliseconds((secs * 1000.0).round() as i64)
        .filter(|lifetime| *lifetime > Duration::zero())
}

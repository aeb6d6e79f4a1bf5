//! Last-value-wins change notification.
//!
//! # Invariants
//! - Every `publish()` installs a token distinct from all previous ones.
//! - Observers only learn that something changed, not how many times.

use std::sync::{Arc, RwLock, RwLockReadGuard};
use uuid::Uuid;

/// Opaque, comparable marker of one published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChangeToken(Uuid);

impl ChangeToken {
    fn fresh() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Shared slot holding the latest token.
#[derive(Debug, Clone)]
pub struct ChangeSignal {
    latest: Arc<RwLock<ChangeToken>>,
}

impl Default for ChangeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSignal {
    pub fn new() -> Self {
        Self {
            latest: Arc::new(RwLock::new(ChangeToken::fresh())),
        }
    }

    /// Replaces the latest token and returns it.
    pub fn publish(&self) -> ChangeToken {
        let token = ChangeToken::fresh();
        let mut guard = self
            .latest
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = token;
        token
    }

    pub fn current(&self) -> ChangeToken {
        *self.read()
    }

    /// Creates an observer that has already seen the current token.
    pub fn subscribe(&self) -> ChangeObserver {
        ChangeObserver {
            last_seen: self.current(),
            signal: self.clone(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, ChangeToken> {
        self.latest
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Polling handle for one consumer.
#[derive(Debug, Clone)]
pub struct ChangeObserver {
    signal: ChangeSignal,
    last_seen: ChangeToken,
}

impl ChangeObserver {
    /// Returns `true` once per observed change and marks it as seen.
    pub fn poll_changed(&mut self) -> bool {
        let current = self.signal.current();
        if current == self.last_seen {
            return false;
        }
        self.last_seen = current;
        true
    }

    pub fn last_seen(&self) -> ChangeToken {
        self.last_seen
    }
}

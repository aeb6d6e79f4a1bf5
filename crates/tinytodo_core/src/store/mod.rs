//! Record stores backed by expiring caches.
//!
//! # Responsibility
//! - Adapt the generic cache to identifiable record types.
//! - Own the per-store snapshot file and its recovery policy.
//!
//! # Invariants
//! - Store construction never propagates load errors.
//! - Save and merge failures degrade silently for callers but are counted.

pub mod record_store;

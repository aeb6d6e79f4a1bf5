//! Domain model for stored items.
//!
//! # Responsibility
//! - Define the record shape persisted in every category store.
//!
//! # Invariants
//! - Every record is identified by a stable, non-empty `RecordId`.

pub mod record;

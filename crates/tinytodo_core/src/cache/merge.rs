//! Field-level merge policy for cache updates.
//!
//! # Responsibility
//! - Define the static merge contract (`MergeFields`) value types implement.
//! - Provide per-field helpers so every implementation applies the same rules.
//!
//! # Invariants
//! - Incoming fields win, except:
//!   - an incoming `None` never clears an existing `Some`;
//!   - an incoming empty `Vec` keeps the existing one when
//!     `ignore_incoming_empty_arrays` is set.
//! - Merging the same incoming value twice yields the same result as once.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Options for `ExpiringCache::merge_update`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Treat empty incoming sequences as absent so they do not clobber
    /// existing data.
    pub ignore_incoming_empty_arrays: bool,
}

impl UpdateOptions {
    pub fn ignoring_empty_arrays() -> Self {
        Self {
            ignore_incoming_empty_arrays: true,
        }
    }
}

/// Merge failure. The stored value is kept when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeError {
    /// Existing and incoming values describe different identities.
    IdentityMismatch { existing: String, incoming: String },
    /// The merged fields do not form a valid value.
    InvalidValue(String),
}

impl Display for MergeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IdentityMismatch { existing, incoming } => write!(
                f,
                "cannot merge value `{incoming}` into value `{existing}`"
            ),
            Self::InvalidValue(message) => write!(f, "merged value is invalid: {message}"),
        }
    }
}

impl Error for MergeError {}

/// Explicit field-by-field combine of an incoming value into an existing one.
pub trait MergeFields: Sized {
    /// Returns the merged value, leaving `self` untouched.
    fn merge_fields(&self, incoming: &Self, options: UpdateOptions) -> Result<Self, MergeError>;
}

/// Plain field: incoming wins.
pub fn merge_scalar<T: Clone>(_existing: &T, incoming: &T) -> T {
    incoming.clone()
}

/// Optional field: incoming wins when present.
pub fn merge_option<T: Clone>(existing: &Option<T>, incoming: &Option<T>) -> Option<T> {
    incoming.clone().or_else(|| existing.clone())
}

/// Sequence field: incoming wins unless it is empty and the caller opted out.
pub fn merge_vec<T: Clone>(existing: &[T], incoming: &[T], options: UpdateOptions) -> Vec<T> {
    if incoming.is_empty() && options.ignore_incoming_empty_arrays {
        return existing.to_vec();
    }
    incoming.to_vec()
}

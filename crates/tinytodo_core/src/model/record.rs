//! Record domain model.
//!
//! # Responsibility
//! - Define the task-like item stored per category.
//! - Provide copy-on-write helpers for the journal's mutation pipeline.
//! - Define how an incoming record merges into a stored one.
//!
//! # Invariants
//! - `id` is non-empty and stable for the record lifetime.
//! - `modified_date >= creation_date`.
//! - `creation_date` is only set at construction.

use crate::cache::{merge_option, merge_scalar, MergeError, MergeFields, UpdateOptions};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

static ABSOLUTE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9+.\-]*://[^\s/?#]+\S*$").expect("valid url regex")
});

/// Stable identifier of a record within one store.
pub type RecordId = String;

/// Record invariant violations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordValidationError {
    EmptyId,
    ModifiedBeforeCreated {
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
    },
}

impl Display for RecordValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyId => write!(f, "record id must not be empty"),
            Self::ModifiedBeforeCreated { created, modified } => write!(
                f,
                "modifiedDate ({}) must be >= creationDate ({})",
                modified.to_rfc3339(),
                created.to_rfc3339()
            ),
        }
    }
}

impl Error for RecordValidationError {}

impl From<RecordValidationError> for MergeError {
    fn from(err: RecordValidationError) -> Self {
        Self::InvalidValue(err.to_string())
    }
}

/// User-facing task item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: RecordId,
    pub title: String,
    pub content: String,
    pub complete: bool,
    pub creation_date: DateTime<Utc>,
    /// Restamped by the journal on every insert/update.
    pub modified_date: DateTime<Utc>,
    /// Free-form link text; see `link_url()` for the displayable form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Record {
    /// Creates an incomplete record with both dates set to `now`.
    pub fn new(
        id: impl Into<RecordId>,
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
            complete: false,
            creation_date: now,
            modified_date: now,
            link: None,
        }
    }

    /// Creates an incomplete record with a generated UUID v4 id.
    pub fn create(
        title: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(Uuid::new_v4().to_string(), title, content, now)
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn validate(&self) -> Result<(), RecordValidationError> {
        if self.id.trim().is_empty() {
            return Err(RecordValidationError::EmptyId);
        }
        if self.modified_date < self.creation_date {
            return Err(RecordValidationError::ModifiedBeforeCreated {
                created: self.creation_date,
                modified: self.modified_date,
            });
        }
        Ok(())
    }

    /// Returns `link` when it is an absolute URL, `None` otherwise.
    pub fn link_url(&self) -> Option<&str> {
        let link = self.link.as_deref()?.trim();
        ABSOLUTE_URL_RE.is_match(link).then_some(link)
    }

    /// Copy with `modified_date` moved to `now`.
    ///
    /// Clamped to `creation_date` so a skewed clock cannot break ordering.
    pub fn touched(&self, now: DateTime<Utc>) -> Self {
        let mut copy = self.clone();
        copy.modified_date = now.max(copy.creation_date);
        copy
    }

    /// Copy with `complete` flipped and `modified_date` moved to `now`.
    pub fn toggled(&self, now: DateTime<Utc>) -> Self {
        let mut copy = self.touched(now);
        copy.complete = !self.complete;
        copy
    }
}

/// `Record` has no sequence fields, so `ignore_incoming_empty_arrays` has no
/// effect on it. `id` and `creation_date` always come from the stored record.
impl MergeFields for Record {
    fn merge_fields(&self, incoming: &Self, _options: UpdateOptions) -> Result<Self, MergeError> {
        if self.id != incoming.id {
            return Err(MergeError::IdentityMismatch {
                existing: self.id.clone(),
                incoming: incoming.id.clone(),
            });
        }

        let merged = Self {
            id: self.id.clone(),
            title: merge_scalar(&self.title, &incoming.title),
            content: merge_scalar(&self.content, &incoming.content),
            complete: merge_scalar(&self.complete, &incoming.complete),
            creation_date: self.creation_date,
            modified_date: merge_scalar(&self.modified_date, &incoming.modified_date),
            link: merge_option(&self.link, &incoming.link),
        };
        merged.validate()?;
        Ok(merged)
    }
}

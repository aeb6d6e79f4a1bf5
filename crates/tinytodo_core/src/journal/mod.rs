//! Category- and day-partitioned record journal.
//!
//! # Responsibility
//! - Select one active `RecordStore` per category and keep the others parked.
//! - Filter records by the calendar day under the day cursor.
//! - Persist after every mutation and publish a change token.
//!
//! # Invariants
//! - Exactly one store is active; switching never discards another
//!   category's state.
//! - Day matching compares local calendar days of `creation_date`, never
//!   full timestamps.
//! - The change signal is last-value-wins; several mutations may surface as
//!   one observed change.

pub mod category;
pub mod change;

pub use category::Category;
pub use change::{ChangeObserver, ChangeSignal, ChangeToken};

use crate::clock::Clock;
use crate::config::JournalConfig;
use crate::model::record::Record;
use crate::store::record_store::{RecordStore, StoreDiagnostics};
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Direction for moving the day cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateDirection {
    Forward,
    Backward,
}

/// Journal of records partitioned by category and creation day.
pub struct PartitionedJournal {
    config: JournalConfig,
    clock: Arc<dyn Clock>,
    category: Category,
    current: RecordStore<Record>,
    parked: BTreeMap<Category, RecordStore<Record>>,
    current_day: NaiveDate,
    signal: ChangeSignal,
}

impl PartitionedJournal {
    /// Opens the journal on `config.initial_category` with the day cursor on
    /// today's local date.
    pub fn open(config: JournalConfig, clock: Arc<dyn Clock>) -> Self {
        let category = config.initial_category;
        let current = open_store(&config, &clock, category);
        let current_day = local_day(clock.now());

        info!(
            "event=journal_open module=journal status=ok category={} day={} store_dir={}",
            category.store_name(),
            current_day,
            config.store_dir.display()
        );

        Self {
            config,
            clock,
            category,
            current,
            parked: BTreeMap::new(),
            current_day,
            signal: ChangeSignal::new(),
        }
    }

    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Makes `category` the active partition, loading its store on first use.
    pub fn select_category(&mut self, category: Category) {
        if category == self.category {
            return;
        }

        let next = match self.parked.remove(&category) {
            Some(store) => store,
            None => open_store(&self.config, &self.clock, category),
        };
        let previous = std::mem::replace(&mut self.current, next);
        self.parked.insert(self.category, previous);
        self.category = category;

        info!(
            "event=category_select module=journal status=ok category={}",
            category.store_name()
        );
        self.signal.publish();
    }

    pub fn current_day(&self) -> NaiveDate {
        self.current_day
    }

    pub fn set_current_day(&mut self, day: NaiveDate) {
        self.current_day = day;
        self.signal.publish();
    }

    /// Moves the day cursor by exactly one calendar day.
    pub fn change_date(&mut self, direction: DateDirection) {
        let one_day = Days::new(1);
        let moved = match direction {
            DateDirection::Forward => self.current_day.checked_add_days(one_day),
            DateDirection::Backward => self.current_day.checked_sub_days(one_day),
        };

        match moved {
            Some(day) => self.set_current_day(day),
            None => warn!(
                "event=change_date module=journal status=error reason=out_of_range day={}",
                self.current_day
            ),
        }
    }

    /// Day cursor rendered as e.g. `Monday - March 02`.
    pub fn current_date_formatted(&self) -> String {
        self.current_day.format("%A - %B %d").to_string()
    }

    /// Fresh record with `id` in the active store.
    pub fn record(&mut self, id: &str) -> Option<Record> {
        self.current.value(&id.to_string())
    }

    /// Records of the active store created on the day under the cursor.
    pub fn all_values(&self) -> Vec<Record> {
        self.current
            .values()
            .into_iter()
            .filter(|record| local_day(record.creation_date) == self.current_day)
            .collect()
    }

    /// Incomplete records of the day, least recently modified first.
    pub fn active_records(&self) -> Vec<Record> {
        let mut records: Vec<_> = self
            .all_values()
            .into_iter()
            .filter(|record| !record.complete)
            .collect();
        records.sort_by(|a, b| {
            a.modified_date
                .cmp(&b.modified_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// Completed records of the day, most recently modified first.
    pub fn completed_records(&self) -> Vec<Record> {
        let mut records: Vec<_> = self
            .all_values()
            .into_iter()
            .filter(|record| record.complete)
            .collect();
        records.sort_by(|a, b| {
            b.modified_date
                .cmp(&a.modified_date)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// Stamps, stores, persists and publishes `record`.
    pub fn insert(&mut self, record: Record) {
        let stamped = record.touched(self.clock.now());
        self.commit(stamped, "insert");
    }

    /// Flips `complete` on a copy of `record`, then follows `insert`.
    pub fn toggle_complete(&mut self, record: &Record) {
        let toggled = record.toggled(self.clock.now());
        self.commit(toggled, "toggle_complete");
    }

    /// Deletes `id` from the active store and persists.
    pub fn remove(&mut self, id: &str) {
        self.current.remove(&id.to_string());
        self.current.save();
        info!(
            "event=record_remove module=journal status=ok category={} id={}",
            self.category.store_name(),
            id
        );
        self.signal.publish();
    }

    /// Empties the active store.
    ///
    /// Persisted only when `persist_on_clear` is set; otherwise the last
    /// snapshot comes back on the next open.
    pub fn clear_data(&mut self) {
        self.current.remove_all();
        if self.config.persist_on_clear {
            self.current.save();
        }
        info!(
            "event=clear_data module=journal status=ok category={} persisted={}",
            self.category.store_name(),
            self.config.persist_on_clear
        );
        self.signal.publish();
    }

    pub fn change_token(&self) -> ChangeToken {
        self.signal.current()
    }

    pub fn subscribe(&self) -> ChangeObserver {
        self.signal.subscribe()
    }

    /// Diagnostics of the active store.
    pub fn diagnostics(&self) -> &StoreDiagnostics {
        self.current.diagnostics()
    }

    fn commit(&mut self, record: Record, action: &str) {
        let id = record.id.clone();
        self.current.insert(record);
        self.current.save();
        info!(
            "event=record_{} module=journal status=ok category={} id={}",
            action,
            self.category.store_name(),
            id
        );
        self.signal.publish();
    }
}

fn open_store(
    config: &JournalConfig,
    clock: &Arc<dyn Clock>,
    category: Category,
) -> RecordStore<Record> {
    RecordStore::open(
        category.store_name(),
        config.store_dir.clone(),
        Arc::clone(clock),
        config.entry_lifetime,
    )
}

/// Local calendar day of `instant`.
pub fn local_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&Local).date_naive()
}

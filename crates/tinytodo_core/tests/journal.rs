use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use std::path::Path;
use std::sync::Arc;
use tinytodo_core::{
    Category, Clock, DateDirection, JournalConfig, ManualClock, PartitionedJournal, Record,
};

fn local(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Local
        .with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .unwrap()
        .with_timezone(&Utc)
}

fn day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn open(dir: &Path, clock: &ManualClock) -> PartitionedJournal {
    let config = JournalConfig::default().with_store_dir(dir);
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    PartitionedJournal::open(config, shared)
}

#[test]
fn opens_on_work_category_and_today() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let journal = open(dir.path(), &clock);

    assert_eq!(journal.category(), Category::Work);
    assert_eq!(journal.current_day(), day(2026, 3, 2));
    assert_eq!(journal.current_date_formatted(), "Monday - March 02");
    assert!(journal.all_values().is_empty());
}

#[test]
fn all_values_only_returns_records_created_on_cursor_day() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);

    journal.insert(Record::new("d1-morning", "A", "", local(2026, 3, 2, 8)));
    journal.insert(Record::new("d1-evening", "B", "", local(2026, 3, 2, 22)));
    journal.insert(Record::new("d2", "C", "", local(2026, 3, 3, 10)));

    let mut ids: Vec<String> = journal.all_values().into_iter().map(|r| r.id).collect();
    ids.sort();
    assert_eq!(ids, vec!["d1-evening".to_string(), "d1-morning".to_string()]);

    journal.change_date(DateDirection::Forward);
    let next: Vec<String> = journal.all_values().into_iter().map(|r| r.id).collect();
    assert_eq!(next, vec!["d2".to_string()]);
}

#[test]
fn modified_date_does_not_affect_day_partition() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    journal.insert(Record::new("1", "A", "", local(2026, 3, 2, 9)));

    clock.set(local(2026, 3, 3, 8));
    let record = journal.record("1").unwrap();
    journal.toggle_complete(&record);

    assert_eq!(journal.all_values().len(), 1);
    journal.set_current_day(day(2026, 3, 3));
    assert!(journal.all_values().is_empty());
}

#[test]
fn insert_stamps_modified_date_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    let record = Record::new("1", "A", "", clock.now());

    clock.advance(Duration::minutes(10));
    journal.insert(record);

    let mut reopened = open(dir.path(), &clock);
    let stored = reopened.record("1").unwrap();
    assert_eq!(stored.title, "A");
    assert!(!stored.complete);
    assert_eq!(stored.modified_date, clock.now());
    assert!(stored.modified_date >= stored.creation_date);
}

#[test]
fn toggle_complete_flips_and_advances_modified_date() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    journal.insert(Record::new("1", "A", "", clock.now()));
    let before = journal.record("1").unwrap();

    clock.advance(Duration::seconds(1));
    journal.toggle_complete(&before);
    let done = journal.record("1").unwrap();
    assert!(done.complete);
    assert!(done.modified_date > before.modified_date);

    clock.advance(Duration::seconds(1));
    journal.toggle_complete(&done);
    let reopened = journal.record("1").unwrap();
    assert!(!reopened.complete);
    assert!(reopened.modified_date > done.modified_date);
}

#[test]
fn switching_categories_keeps_each_partition_intact() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    journal.insert(Record::new("w1", "work item", "", clock.now()));

    journal.select_category(Category::Home);
    assert_eq!(journal.category(), Category::Home);
    assert!(journal.all_values().is_empty());
    journal.insert(Record::new("h1", "home item", "", clock.now()));

    journal.select_category(Category::Work);
    let work: Vec<String> = journal.all_values().into_iter().map(|r| r.id).collect();
    assert_eq!(work, vec!["w1".to_string()]);

    assert!(dir.path().join("work.store.cache").exists());
    assert!(dir.path().join("home.store.cache").exists());
    assert!(!dir.path().join("app.store.cache").exists());
}

#[test]
fn category_state_is_durable_across_journal_instances() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    {
        let mut journal = open(dir.path(), &clock);
        journal.select_category(Category::App);
        journal.insert(Record::new("a1", "app item", "", clock.now()));
    }

    let mut journal = open(dir.path(), &clock);
    assert!(journal.all_values().is_empty());
    journal.select_category(Category::App);
    assert_eq!(journal.all_values().len(), 1);
}

#[test]
fn remove_deletes_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    journal.insert(Record::new("1", "A", "", clock.now()));
    journal.insert(Record::new("2", "B", "", clock.now()));

    journal.remove("1");
    journal.remove("missing");
    assert!(journal.record("1").is_none());

    let mut reopened = open(dir.path(), &clock);
    assert!(reopened.record("1").is_none());
    assert!(reopened.record("2").is_some());
}

#[test]
fn clear_data_persists_by_default() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    journal.insert(Record::new("1", "A", "", clock.now()));

    journal.clear_data();
    assert!(journal.all_values().is_empty());

    let reopened = open(dir.path(), &clock);
    assert!(reopened.all_values().is_empty());
}

#[test]
fn clear_data_can_be_memory_only() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let config = JournalConfig {
        persist_on_clear: false,
        ..JournalConfig::default().with_store_dir(dir.path())
    };
    let shared: Arc<dyn Clock> = Arc::new(clock.clone());
    let mut journal = PartitionedJournal::open(config, shared);
    journal.insert(Record::new("1", "A", "", clock.now()));

    journal.clear_data();
    assert!(journal.all_values().is_empty());

    let reopened = open(dir.path(), &clock);
    assert_eq!(reopened.all_values().len(), 1);
}

#[test]
fn mutations_publish_change_tokens() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);
    let mut observer = journal.subscribe();
    let initial = journal.change_token();
    assert!(!observer.poll_changed());

    journal.insert(Record::new("1", "A", "", clock.now()));
    assert_ne!(journal.change_token(), initial);
    assert!(observer.poll_changed());

    let record = journal.record("1").unwrap();
    journal.toggle_complete(&record);
    journal.change_date(DateDirection::Backward);
    assert!(observer.poll_changed());
    assert!(!observer.poll_changed());
}

#[test]
fn change_date_moves_exactly_one_day_without_bounds() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 1, 9));
    let mut journal = open(dir.path(), &clock);

    journal.change_date(DateDirection::Backward);
    assert_eq!(journal.current_day(), day(2026, 2, 28));
    journal.change_date(DateDirection::Forward);
    journal.change_date(DateDirection::Forward);
    assert_eq!(journal.current_day(), day(2026, 3, 2));

    journal.set_current_day(day(1999, 12, 31));
    journal.change_date(DateDirection::Forward);
    assert_eq!(journal.current_day(), day(2000, 1, 1));
}

#[test]
fn active_and_completed_views_are_sorted_by_modified_date() {
    let dir = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);

    for id in ["a", "b", "c", "d"] {
        journal.insert(Record::new(id, id, "", local(2026, 3, 2, 8)));
        clock.advance(Duration::minutes(1));
    }
    let c = journal.record("c").unwrap();
    journal.toggle_complete(&c);
    clock.advance(Duration::minutes(1));
    let a = journal.record("a").unwrap();
    journal.toggle_complete(&a);

    let active: Vec<String> = journal.active_records().into_iter().map(|r| r.id).collect();
    assert_eq!(active, vec!["b".to_string(), "d".to_string()]);

    let completed: Vec<String> = journal
        .completed_records()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(completed, vec!["a".to_string(), "c".to_string()]);
}

#[test]
fn corrupt_category_snapshot_does_not_break_journal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("home.store.cache"), b"[]").unwrap();
    let clock = ManualClock::new(local(2026, 3, 2, 9));
    let mut journal = open(dir.path(), &clock);

    journal.select_category(Category::Home);
    assert!(journal.all_values().is_empty());
    journal.insert(Record::new("h1", "home", "", clock.now()));
    assert_eq!(journal.all_values().len(), 1);
    assert_eq!(journal.diagnostics().failed_saves, 0);
}

//! CLI smoke entry point.
//!
//! # Responsibility
//! - Open the journal with environment configuration.
//! - Print today's per-category record counts for quick local checks.

use log::info;
use tinytodo_core::{
    core_version, default_log_level, init_logging, system_clock, Category, JournalConfig,
    PartitionedJournal,
};

const LOG_DIR_ENV: &str = "TINYTODO_LOG_DIR";

fn main() {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("tinytodo logging disabled: {err}");
        }
    }

    let config = JournalConfig::from_env();
    println!("tinytodo_core version={}", core_version());
    println!("store_dir={}", config.store_dir.display());

    let mut journal = PartitionedJournal::open(config, system_clock());
    println!("day={}", journal.current_date_formatted());

    for category in Category::ALL {
        journal.select_category(category);
        let open = journal.active_records().len();
        let done = journal.completed_records().len();
        println!("{:<5} open={open} done={done}", category.display_text());
        info!(
            "event=cli_summary module=cli status=ok category={} open={} done={}",
            category.store_name(),
            open,
            done
        );
    }
}

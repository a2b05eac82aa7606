//! Headless maintenance sweep: materializes due recurring transactions and
//! emits budget alerts. Intended to be run manually or from an external
//! timer (cron, systemd, a desktop scheduler).

use std::sync::Arc;

use pocketbook::config::SettingsManager;
use pocketbook::core::services::{BudgetService, ScheduleEngine};
use pocketbook::core::SystemClock;
use pocketbook::errors::Result;
use pocketbook::init;
use pocketbook::storage::JsonStore;

fn main() {
    init();

    if let Err(err) = run_sweep() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run_sweep() -> Result<()> {
    let settings = match std::env::var_os("POCKETBOOK_CONFIG_DIR") {
        Some(dir) => SettingsManager::with_base_dir(dir.into())?.load()?,
        None => SettingsManager::default_location()?.load()?,
    };
    let store = JsonStore::new(settings.resolve_data_dir())?;
    let clock = Arc::new(SystemClock);

    let engine = ScheduleEngine::new(store.clone(), clock.clone());
    let processed = engine.process_due()?;

    let budgets = BudgetService::new(store, clock);
    let alerted = budgets.sweep_alerts()?;

    println!("processed {processed} due template(s), emitted {alerted} budget alert(s)");
    Ok(())
}

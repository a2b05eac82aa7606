use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use tempfile::TempDir;

use pocketbook::core::services::{CategoryService, UserDirectory};
use pocketbook::core::FixedClock;
use pocketbook::domain::{Category, TransactionKind, User, UserRole};
use pocketbook::storage::JsonStore;

/// Holds TempDir guards so temporary folders live for the duration of the
/// test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Creates an isolated JSON store backed by a unique directory.
pub fn setup_store() -> JsonStore {
    let temp = TempDir::new().expect("create temp dir");
    let store = JsonStore::new(temp.path().join("data")).expect("create json store");
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    store
}

pub fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn clock(now: NaiveDateTime) -> Arc<FixedClock> {
    Arc::new(FixedClock(now))
}

/// Seeds one admin, one regular user, and one expense + one income category
/// owned by the regular user.
pub fn seed_base_records(
    store: &JsonStore,
    now: NaiveDateTime,
) -> (User, User, Category, Category) {
    let users = UserDirectory::new(store.clone(), clock(now));
    let admin = users.add("admin", UserRole::Admin).expect("seed admin");
    let member = users.add("casey", UserRole::User).expect("seed user");

    let categories = CategoryService::new(store.clone(), clock(now));
    let expense = categories
        .add(Some(&member.user_id), "Utilities", TransactionKind::Expense)
        .expect("seed expense category");
    let income = categories
        .add(Some(&member.user_id), "Salary", TransactionKind::Income)
        .expect("seed income category");

    (admin, member, expense, income)
}

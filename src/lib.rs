#![doc(test(attr(deny(warnings))))]

//! Pocketbook is a personal finance engine: user accounts, categorized
//! transactions, budgets with alert thresholds, recurring transaction
//! schedules, and notifications, persisted as flat JSON collections.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Pocketbook tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}

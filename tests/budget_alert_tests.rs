mod common;

use chrono::NaiveDate;

use common::{at, clock, seed_base_records, setup_store};
use pocketbook::core::services::{BudgetService, NotificationService, TransactionLedger};
use pocketbook::domain::{BudgetPeriod, NotificationPriority, TransactionKind};
use pocketbook::errors::EngineError;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn add_validates_category_amount_and_threshold() {
    let store = setup_store();
    let now = at(2024, 1, 1);
    let (_, member, expense, income) = seed_base_records(&store, now);
    let budgets = BudgetService::new(store, clock(now));

    let err = budgets
        .add(&member.user_id, &income.category_id, 500.0, BudgetPeriod::Monthly, 0.8)
        .expect_err("income category");
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = budgets
        .add(&member.user_id, &expense.category_id, -1.0, BudgetPeriod::Monthly, 0.8)
        .expect_err("negative amount");
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let err = budgets
        .add(&member.user_id, &expense.category_id, 500.0, BudgetPeriod::Monthly, 1.5)
        .expect_err("threshold over 1");
    assert!(matches!(err, EngineError::InvalidInput(_)));

    let budget = budgets
        .add(&member.user_id, &expense.category_id, 500.0, BudgetPeriod::Monthly, 0.8)
        .expect("valid budget");
    assert_eq!(budget.budget_id, "bud_001");

    let err = budgets
        .add(&member.user_id, &expense.category_id, 700.0, BudgetPeriod::Monthly, 0.9)
        .expect_err("duplicate category budget");
    assert!(matches!(err, EngineError::InvalidInput(_)));
}

#[test]
fn status_sums_only_the_current_window() {
    let store = setup_store();
    let now = at(2024, 2, 14);
    let (_, member, expense, _) = seed_base_records(&store, now);
    let ledger = TransactionLedger::new(store.clone(), clock(now));
    let budgets = BudgetService::new(store, clock(now));

    budgets
        .add(&member.user_id, &expense.category_id, 1_000.0, BudgetPeriod::Monthly, 0.8)
        .expect("budget");

    let spend = |amount: f64, day: NaiveDate| {
        ledger
            .record(
                &member.user_id,
                &expense.category_id,
                amount,
                TransactionKind::Expense,
                "spend",
                day,
                Vec::new(),
            )
            .expect("record")
    };
    spend(300.0, date(2024, 2, 3));
    spend(200.0, date(2024, 2, 10));
    spend(999.0, date(2024, 1, 25)); // previous month, ignored

    let status = budgets
        .status_for_user(&member.user_id, date(2024, 2, 14))
        .expect("status");
    assert_eq!(status.len(), 1);
    assert_eq!(status[0].spent, 500.0);
    assert_eq!(status[0].remaining, 500.0);
    assert!((status[0].utilization - 0.5).abs() < 1e-9);
    assert_eq!(status[0].window_start, date(2024, 2, 1));
    assert_eq!(status[0].window_end, date(2024, 3, 1));
}

#[test]
fn sweep_emits_alert_only_at_threshold() {
    let store = setup_store();
    let now = at(2024, 2, 14);
    let (_, member, expense, _) = seed_base_records(&store, now);
    let ledger = TransactionLedger::new(store.clone(), clock(now));
    let budgets = BudgetService::new(store.clone(), clock(now));
    let notifications = NotificationService::new(store, clock(now));

    budgets
        .add(&member.user_id, &expense.category_id, 1_000.0, BudgetPeriod::Monthly, 0.8)
        .expect("budget");

    ledger
        .record(
            &member.user_id,
            &expense.category_id,
            700.0,
            TransactionKind::Expense,
            "under threshold",
            date(2024, 2, 5),
            Vec::new(),
        )
        .expect("record");
    assert_eq!(budgets.sweep_alerts().expect("quiet sweep"), 0);
    assert_eq!(notifications.unread_count(&member.user_id).unwrap(), 0);

    ledger
        .record(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "crosses threshold",
            date(2024, 2, 6),
            Vec::new(),
        )
        .expect("record");
    assert_eq!(budgets.sweep_alerts().expect("alerting sweep"), 1);

    let inbox = notifications.list_for_user(&member.user_id).expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, "budget_alert");
    assert_eq!(inbox[0].priority, NotificationPriority::High);
    assert_eq!(inbox[0].data["budget_id"], "bud_001");
    assert_eq!(inbox[0].data["spent"], 800.0);
}

#[test]
fn budget_removal_respects_ownership() {
    let store = setup_store();
    let now = at(2024, 1, 1);
    let (admin, member, expense, _) = seed_base_records(&store, now);
    let budgets = BudgetService::new(store, clock(now));

    let budget = budgets
        .add(&member.user_id, &expense.category_id, 500.0, BudgetPeriod::Monthly, 0.8)
        .expect("budget");

    let err = budgets
        .remove("user_999", &budget.budget_id)
        .expect_err("stranger removal");
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    budgets
        .remove(&admin.user_id, &budget.budget_id)
        .expect("admin removal");
    assert!(budgets
        .status_for_user(&member.user_id, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap())
        .unwrap()
        .is_empty());
}

#[test]
fn mark_read_requires_ownership() {
    let store = setup_store();
    let now = at(2024, 1, 1);
    let (admin, member, _, _) = seed_base_records(&store, now);
    let notifications = NotificationService::new(store, clock(now));

    let ntf = notifications
        .create(
            &member.user_id,
            "budget_alert",
            "Budget threshold reached",
            "test",
            NotificationPriority::High,
            serde_json::json!({}),
        )
        .expect("create");

    let err = notifications
        .mark_read(&admin.user_id, &ntf.notification_id)
        .expect_err("foreign mark_read");
    assert!(matches!(err, EngineError::PermissionDenied(_)));

    notifications
        .mark_read(&member.user_id, &ntf.notification_id)
        .expect("owner mark_read");
    assert_eq!(notifications.unread_count(&member.user_id).unwrap(), 0);
}

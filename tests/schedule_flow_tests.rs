mod common;

use chrono::NaiveDate;

use common::{at, clock, seed_base_records, setup_store};
use pocketbook::core::services::{NotificationService, ScheduleEngine, TransactionLedger};
use pocketbook::domain::{Frequency, RecurringPatch, TransactionKind};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn get_due_filters_on_flags_window_and_end_date() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let make = |description: &str, auto_create: bool, end_date: Option<NaiveDate>| {
        setup
            .create(
                &member.user_id,
                &expense.category_id,
                100.0,
                TransactionKind::Expense,
                description,
                Frequency::Monthly,
                Some(date(2024, 1, 1)),
                end_date,
                Vec::new(),
                auto_create,
            )
            .expect("create template")
    };

    let due = make("due", true, None);
    let manual = make("manual", false, None);
    let ended = make("ended", true, Some(date(2024, 2, 15)));
    let still_running = make("still running", true, Some(date(2024, 4, 1)));
    let paused = make("paused", true, None);
    setup
        .deactivate(&member.user_id, &paused.recurring_id)
        .expect("pause");

    // All templates have next_date 2024-02-01; look from 2024-03-01.
    let engine = ScheduleEngine::new(store, clock(at(2024, 3, 1)));
    let due_now = engine.get_due(&member.user_id).expect("get_due");
    let ids: Vec<&str> = due_now.iter().map(|tpl| tpl.recurring_id.as_str()).collect();

    assert_eq!(ids, vec![due.recurring_id.as_str(), still_running.recurring_id.as_str()]);
    assert!(!ids.contains(&manual.recurring_id.as_str()));
    assert!(!ids.contains(&ended.recurring_id.as_str()));
    assert!(!ids.contains(&paused.recurring_id.as_str()));
}

#[test]
fn get_due_never_returns_templates_past_their_end_date() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    setup
        .create(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "expires today",
            Frequency::Monthly,
            Some(date(2024, 1, 1)),
            Some(date(2024, 3, 1)),
            Vec::new(),
            true,
        )
        .expect("create");

    // end_date == today: no longer due.
    let engine = ScheduleEngine::new(store, clock(at(2024, 3, 1)));
    assert!(engine.get_due(&member.user_id).unwrap().is_empty());
}

#[test]
fn get_upcoming_is_window_bounded_and_sorted() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let make = |description: &str, start: NaiveDate| {
        setup
            .create(
                &member.user_id,
                &expense.category_id,
                50.0,
                TransactionKind::Expense,
                description,
                Frequency::Weekly,
                Some(start),
                None,
                Vec::new(),
                true,
            )
            .expect("create template")
    };
    // next_dates: Jan 9, Jan 12, Jan 14, Jan 20.
    make("later", date(2024, 1, 5));
    make("soonest", date(2024, 1, 2));
    make("edge", date(2024, 1, 7));
    make("outside", date(2024, 1, 13));

    let engine = ScheduleEngine::new(store, clock(at(2024, 1, 7)));
    let upcoming = engine.get_upcoming(&member.user_id, 7).expect("get_upcoming");
    let descriptions: Vec<&str> = upcoming.iter().map(|tpl| tpl.description.as_str()).collect();

    assert_eq!(descriptions, vec!["soonest", "later", "edge"]);
    let horizon = at(2024, 1, 14);
    for tpl in &upcoming {
        let next = tpl.next_date.expect("next date");
        assert!(next >= at(2024, 1, 7) && next <= horizon);
    }
}

#[test]
fn process_due_materializes_advances_and_notifies() {
    let store = setup_store();
    let seeded = at(2024, 1, 10);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let template = setup
        .create(
            &member.user_id,
            &expense.category_id,
            150_000.0,
            TransactionKind::Expense,
            "Internet bill",
            Frequency::Monthly,
            Some(date(2024, 1, 15)),
            None,
            vec!["utilities".into()],
            true,
        )
        .expect("create template");
    assert_eq!(template.next_date, Some(at(2024, 2, 15)));

    let now = at(2024, 2, 20);
    let engine = ScheduleEngine::new(store.clone(), clock(now));
    let processed = engine.process_due().expect("process_due");
    assert_eq!(processed, 1);

    // The occurrence is dated on the old next_date and tagged.
    let ledger = TransactionLedger::new(store.clone(), clock(now));
    let transactions = ledger.list_for_user(&member.user_id).expect("transactions");
    assert_eq!(transactions.len(), 1);
    let txn = &transactions[0];
    assert_eq!(txn.date, date(2024, 2, 15));
    assert_eq!(txn.amount, 150_000.0);
    assert_eq!(txn.description, "Internet bill (auto)");
    assert!(txn.tags.iter().any(|tag| tag == "recurring"));
    assert!(txn.tags.iter().any(|tag| tag == "utilities"));

    // The template advanced exactly one period and was stamped.
    let stored = engine
        .get(&member.user_id, &template.recurring_id)
        .unwrap()
        .expect("template");
    assert_eq!(stored.next_date, Some(at(2024, 3, 15)));
    assert_eq!(stored.last_processed, Some(now));

    // The owner was notified with the transaction reference.
    let notifications = NotificationService::new(store, clock(now));
    let inbox = notifications.list_for_user(&member.user_id).expect("inbox");
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, "recurring_posted");
    assert_eq!(inbox[0].data["transaction_id"], txn.transaction_id.as_str());
    assert_eq!(inbox[0].data["recurring_id"], template.recurring_id.as_str());

    // Nothing is due anymore; a second sweep is a no-op.
    assert_eq!(engine.process_due().expect("second sweep"), 0);
}

#[test]
fn process_due_sweeps_all_users() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);

    let users = pocketbook::core::services::UserDirectory::new(store.clone(), clock(seeded));
    let other = users
        .add("robin", pocketbook::domain::UserRole::User)
        .expect("second user");
    let categories =
        pocketbook::core::services::CategoryService::new(store.clone(), clock(seeded));
    let other_cat = categories
        .add(Some(&other.user_id), "Rent", TransactionKind::Expense)
        .expect("second category");

    let setup = ScheduleEngine::new(store.clone(), clock(seeded));
    setup
        .create(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "Internet",
            Frequency::Monthly,
            Some(date(2024, 1, 1)),
            None,
            Vec::new(),
            true,
        )
        .expect("first template");
    setup
        .create(
            &other.user_id,
            &other_cat.category_id,
            900.0,
            TransactionKind::Expense,
            "Rent",
            Frequency::Monthly,
            Some(date(2024, 1, 1)),
            None,
            Vec::new(),
            true,
        )
        .expect("second template");

    let engine = ScheduleEngine::new(store.clone(), clock(at(2024, 2, 5)));
    assert_eq!(engine.process_due().expect("sweep"), 2);

    let ledger = TransactionLedger::new(store, clock(at(2024, 2, 5)));
    assert_eq!(ledger.list_for_user(&member.user_id).unwrap().len(), 1);
    assert_eq!(ledger.list_for_user(&other.user_id).unwrap().len(), 1);
}

#[test]
fn process_due_handles_month_end_chains() {
    let store = setup_store();
    let seeded = at(2024, 1, 31);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let template = setup
        .create(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "Card payment",
            Frequency::Monthly,
            Some(date(2024, 1, 31)),
            None,
            Vec::new(),
            true,
        )
        .expect("create");
    assert_eq!(template.next_date, Some(at(2024, 2, 29)));

    let engine = ScheduleEngine::new(store, clock(at(2024, 3, 1)));
    assert_eq!(engine.process_due().expect("sweep"), 1);
    let stored = engine
        .get(&member.user_id, &template.recurring_id)
        .unwrap()
        .expect("template");
    // Feb 29 + 1 month clamps to Mar 29.
    assert_eq!(stored.next_date, Some(at(2024, 3, 29)));
}

#[test]
fn manual_templates_are_skipped_but_still_listed_as_upcoming() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let manual = setup
        .create(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "Manual check",
            Frequency::Weekly,
            Some(date(2024, 1, 1)),
            None,
            Vec::new(),
            false,
        )
        .expect("create manual template");

    // Date-due (next_date Jan 8) but auto_create is off: the sweep skips it
    // and nothing advances.
    let sweeper = ScheduleEngine::new(store.clone(), clock(at(2024, 1, 10)));
    assert_eq!(sweeper.process_due().expect("sweep"), 0);
    assert!(sweeper.get_due(&member.user_id).unwrap().is_empty());

    // It still shows up as upcoming ahead of its occurrence date.
    let engine = ScheduleEngine::new(store, clock(at(2024, 1, 7)));
    let upcoming = engine.get_upcoming(&member.user_id, 7).expect("upcoming");
    assert_eq!(upcoming.len(), 1);
    assert_eq!(upcoming[0].recurring_id, manual.recurring_id);
}

#[test]
fn deactivated_template_resumes_where_it_left_off() {
    let store = setup_store();
    let seeded = at(2024, 1, 1);
    let (_, member, expense, _) = seed_base_records(&store, seeded);
    let setup = ScheduleEngine::new(store.clone(), clock(seeded));

    let template = setup
        .create(
            &member.user_id,
            &expense.category_id,
            100.0,
            TransactionKind::Expense,
            "Subscription",
            Frequency::Monthly,
            Some(date(2024, 1, 1)),
            None,
            Vec::new(),
            true,
        )
        .expect("create");
    setup
        .deactivate(&member.user_id, &template.recurring_id)
        .expect("pause");

    let engine = ScheduleEngine::new(store.clone(), clock(at(2024, 2, 10)));
    assert_eq!(engine.process_due().expect("paused sweep"), 0);

    engine
        .update(
            &member.user_id,
            &template.recurring_id,
            RecurringPatch {
                is_active: Some(true),
                ..RecurringPatch::default()
            },
        )
        .expect("resume");
    assert_eq!(engine.process_due().expect("resumed sweep"), 1);
}

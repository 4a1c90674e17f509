mod common;

use std::sync::Arc;

use common::{at, ManualClock};
use expense_core::storage::{MemoryKv, RemoteStore};
use expense_core::{Account, AccountKind, Tracker, Transaction};

async fn tracker_with_clock(start_secs: i64) -> (Tracker, ManualClock) {
    common::init();
    let clock = ManualClock::starting_at(at(start_secs));
    let store = Arc::new(RemoteStore::new(MemoryKv::new()));
    let tracker = Tracker::load(store, Arc::new(clock.clone())).await;
    (tracker, clock)
}

#[tokio::test]
async fn logged_expense_then_unexplained_drift() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Savings, 1000.0))
        .await
        .unwrap();

    tracker
        .add_transaction(Transaction::expense("A", 200.0, at(100)))
        .await
        .unwrap();

    clock.set(at(200));
    let first = tracker.report_balance("A", "700").await.unwrap();
    assert_eq!(first.input_income, 0.0);
    assert_eq!(first.input_expense, 200.0);
    assert_eq!(first.balance_based_expense, 300.0);

    // Next check-in with nothing logged in between: the whole 50 is drift.
    clock.set(at(400));
    let second = tracker.report_balance("A", "650").await.unwrap();
    assert_eq!(second.input_income, 0.0);
    assert_eq!(second.input_expense, 0.0);
    assert_eq!(second.balance_based_expense, 50.0);

    let account = tracker.account("A").unwrap();
    assert_eq!(account.balance, 650.0);
    assert_eq!(account.updates.len(), 2);
    assert!(account.updates[0].date > account.updates[1].date);
}

#[tokio::test]
async fn transfer_between_two_reports() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Current, 700.0))
        .await
        .unwrap();
    tracker
        .add_account(Account::new("B", AccountKind::Savings, 0.0))
        .await
        .unwrap();

    clock.set(at(100));
    tracker.report_balance("A", "700").await.unwrap();

    tracker
        .add_transaction(Transaction::transfer("A", "B", 500.0, at(150)))
        .await
        .unwrap();

    clock.set(at(200));
    let update = tracker.report_balance("A", "200").await.unwrap();
    assert_eq!(update.input_expense, 500.0);
    assert_eq!(update.input_income, 0.0);
    assert_eq!(update.balance_based_expense, 500.0);

    let receiving = tracker.report_balance("B", "500").await.unwrap();
    assert_eq!(receiving.input_income, 500.0);
    assert_eq!(receiving.input_expense, 0.0);
    assert_eq!(receiving.balance_based_expense, 0.0);
}

#[tokio::test]
async fn update_history_grows_one_entry_per_report() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Savings, 100.0))
        .await
        .unwrap();

    for step in 1..=5i64 {
        clock.set(at(step * 60));
        tracker
            .report_balance("A", &format!("{}", 100 - step))
            .await
            .unwrap();
    }

    let account = tracker.account("A").unwrap();
    assert_eq!(account.updates.len(), 5);
    assert!(account
        .updates
        .windows(2)
        .all(|pair| pair[0].date > pair[1].date));
}

#[tokio::test]
async fn reconciliation_is_deterministic() {
    let mut residuals = Vec::new();
    for _ in 0..2 {
        let (mut tracker, clock) = tracker_with_clock(0).await;
        tracker
            .add_account(Account::new("A", AccountKind::Savings, 1234.56))
            .await
            .unwrap();
        tracker
            .add_transaction(Transaction::income("A", 11.11, at(10)))
            .await
            .unwrap();
        tracker
            .add_transaction(Transaction::expense("A", 22.22, at(20)))
            .await
            .unwrap();

        clock.set(at(100));
        let update = tracker.report_balance("A", "1200.00").await.unwrap();
        residuals.push(update.balance_based_expense);
    }
    assert_eq!(residuals[0], residuals[1]);
    // previous.balance + input_income - new_balance, reproduced exactly.
    assert_eq!(residuals[0], 1234.56 + 11.11 - 1200.00);
}

#[tokio::test]
async fn negative_residual_is_preserved_in_totals() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Savings, 100.0))
        .await
        .unwrap();

    clock.set(at(60));
    let update = tracker.report_balance("A", "130").await.unwrap();
    assert_eq!(update.balance_based_expense, -30.0);

    let totals = tracker.totals();
    assert_eq!(totals.balance_based_expense, -30.0);
}

#[tokio::test]
async fn totals_reflect_only_the_latest_update_per_account() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Savings, 1000.0))
        .await
        .unwrap();
    tracker
        .add_account(Account::new("B", AccountKind::Current, 500.0))
        .await
        .unwrap();

    clock.set(at(60));
    tracker.report_balance("A", "900").await.unwrap();
    clock.set(at(120));
    tracker.report_balance("A", "850").await.unwrap();
    clock.set(at(180));
    tracker.report_balance("B", "480").await.unwrap();

    let totals = tracker.totals();
    // Default seed accounts contribute zero balance and have no updates.
    assert_eq!(totals.balance, 850.0 + 480.0);
    assert_eq!(totals.balance_based_expense, 50.0 + 20.0);
    assert_eq!(totals.input_expense, 0.0);
}

#[tokio::test]
async fn export_rows_render_one_row_per_update_plus_totals() {
    let (mut tracker, clock) = tracker_with_clock(0).await;
    tracker
        .add_account(Account::new("A", AccountKind::Savings, 100.0))
        .await
        .unwrap();
    clock.set(at(60));
    tracker.report_balance("A", "90").await.unwrap();
    clock.set(at(120));
    tracker.report_balance("A", "80").await.unwrap();

    let rows = tracker.export_rows();
    let a_rows: Vec<_> = rows.iter().filter(|r| r.account_name == "A").collect();
    // Current-state row plus the two update rows.
    assert_eq!(a_rows.len(), 3);
    assert_eq!(rows.last().unwrap().account_name, "TOTAL");
    assert_eq!(rows.last().unwrap().balance, 80.0);
}

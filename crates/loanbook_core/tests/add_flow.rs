//! Add/delete flows end to end: form → store → view.

use crate::common::test_helpers::{add_item, add_money, fixed_now, memory_store, store_without_table};
use loanbook_core::crud::{self, AddedId, LAST_CURRENCY_KEY};
use loanbook_core::ledger::Totals;
use loanbook_core::{
    Collection, Counterparty, Direction, ItemTransaction, MoneyTransaction, MoneyTransactionId, TransactionForm,
};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[test]
fn new_counterparty_money_loan_shows_in_lent_group() {
    let store = memory_store();

    let added = add_money(&store, "Alice", "100", "UAH", Direction::Lend);

    assert!(added.counterparty_created);
    let cps = store.list::<Counterparty>().unwrap();
    assert_eq!(cps.len(), 1);
    assert_eq!(cps[0].name, "Alice");
    assert_eq!(cps[0].id, added.counterparty_id);

    let money = store.list::<MoneyTransaction>().unwrap();
    assert_eq!(money.len(), 1);
    assert_eq!(money[0].counterparty_id, added.counterparty_id);
    assert_eq!(money[0].created_at, fixed_now());
    assert_eq!(added.id, AddedId::Money(money[0].id));

    let view = crud::load_view(&store).unwrap();
    assert_eq!(view.lent_money.len(), 1);
    assert_eq!(view.lent_money[0].counterparty.display_name(), "Alice");
    assert_eq!(view.totals.get("UAH"), Some(&Totals { lent: 100.0, borrowed: 0.0 }));
    assert_eq!(view.totals.lent_summary().get("UAH"), Some(&100.0));
    assert!(view.totals.borrowed_summary().is_empty());
}

#[test]
fn repeated_names_reuse_the_counterparty() {
    let store = memory_store();
    let first = add_money(&store, "Alice", "10", "UAH", Direction::Lend);
    let second = add_item(&store, "alice", "Umbrella", Direction::Borrow);
    let third = add_money(&store, "ALICE ", "5", "USD", Direction::Borrow);
    let other = add_item(&store, "Bob", "Drill", Direction::Lend);

    assert!(!second.counterparty_created);
    assert!(!third.counterparty_created);
    assert!(other.counterparty_created);
    assert_eq!(second.counterparty_id, first.counterparty_id);
    assert_eq!(third.counterparty_id, first.counterparty_id);
    assert_eq!(store.count(Collection::Counterparties).unwrap(), 2);
}

#[test]
fn groups_and_totals_from_mixed_transactions() {
    let store = memory_store();
    add_money(&store, "Alice", "100", "UAH", Direction::Lend);
    add_money(&store, "Bob", "50", "uah", Direction::Borrow);
    add_money(&store, "Carol", "20", "USD", Direction::Lend);
    add_item(&store, "Bob", "Tent", Direction::Lend);
    add_item(&store, "Library", "Book", Direction::Borrow);

    let view = crud::load_view(&store).unwrap();

    assert_eq!(view.transaction_count(), 5);
    assert_eq!(view.lent_money.len(), 2);
    assert_eq!(view.borrowed_money.len(), 1);
    assert_eq!(view.lent_items.len(), 1);
    assert_eq!(view.borrowed_items.len(), 1);
    assert_eq!(view.totals.get("UAH"), Some(&Totals { lent: 100.0, borrowed: 50.0 }));
    assert_eq!(view.totals.get("USD"), Some(&Totals { lent: 20.0, borrowed: 0.0 }));
    assert!(!view.totals.borrowed_summary().contains_key("USD"));
}

#[test]
fn invalid_form_creates_nothing() {
    let store = memory_store();
    let form = TransactionForm::money("Alice", "-3", "UAH", Direction::Lend);
    assert!(form.validate().is_err());

    let form = TransactionForm::money("", "10", "UAH", Direction::Lend);
    assert!(form.validate().is_err());

    assert_eq!(store.count(Collection::Counterparties).unwrap(), 0);
    assert_eq!(store.count(Collection::MoneyTransactions).unwrap(), 0);
}

#[test]
fn deleted_counterparty_shows_as_unknown() {
    let store = memory_store();
    let added = add_item(&store, "Neighbour", "Ladder", Direction::Lend);
    store.delete::<Counterparty>(added.counterparty_id).unwrap();

    let view = crud::load_view(&store).unwrap();
    assert_eq!(view.lent_items.len(), 1);
    assert!(view.lent_items[0].counterparty.is_unknown());
    assert_eq!(view.lent_items[0].counterparty.display_name(), "Unknown");
}

#[test]
fn delete_flows_are_idempotent() {
    let store = memory_store();
    let added = add_money(&store, "Alice", "10", "EUR", Direction::Lend);
    let item = add_item(&store, "Alice", "Book", Direction::Lend);
    let AddedId::Money(money_id) = added.id else {
        panic!("expected money id");
    };
    let AddedId::Item(item_id) = item.id else {
        panic!("expected item id");
    };

    crud::delete_money_transaction(&store, money_id).unwrap();
    crud::delete_money_transaction(&store, money_id).unwrap();
    crud::delete_item_transaction(&store, item_id).unwrap();
    crud::delete_money_transaction(&store, MoneyTransactionId(31_337)).unwrap();

    assert!(store.list::<MoneyTransaction>().unwrap().is_empty());
    assert!(store.list::<ItemTransaction>().unwrap().is_empty());
    assert!(crud::load_view(&store).unwrap().is_empty());
}

#[test]
fn bulk_delete_removes_each() {
    let store = memory_store();
    let ids: Vec<MoneyTransactionId> = (1..=3)
        .map(|n| match add_money(&store, "Alice", &n.to_string(), "UAH", Direction::Lend).id {
            AddedId::Money(id) => id,
            AddedId::Item(_) => unreachable!(),
        })
        .collect();
    crud::bulk_delete_money_transactions(&store, &ids).unwrap();
    assert_eq!(store.count(Collection::MoneyTransactions).unwrap(), 0);
}

#[test]
fn last_money_currency_becomes_preferred() {
    let store = memory_store();
    assert_eq!(crud::preferred_currency(&store, "UAH").unwrap(), "UAH");

    add_money(&store, "Alice", "10", "usd", Direction::Lend);
    assert_eq!(store.config_get(LAST_CURRENCY_KEY).unwrap().as_deref(), Some("USD"));
    assert_eq!(crud::preferred_currency(&store, "UAH").unwrap(), "USD");

    add_item(&store, "Alice", "Book", Direction::Lend);
    assert_eq!(crud::preferred_currency(&store, "UAH").unwrap(), "USD");
}

#[test]
fn failed_currency_write_keeps_nothing() {
    let store = store_without_table("config");
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let _sub = store.subscribe(Collection::MoneyTransactions, move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });

    let draft = TransactionForm::money("Alice", "100", "UAH", Direction::Lend).validate().unwrap();
    let err = crud::add_transaction(&store, draft, fixed_now()).unwrap_err();

    assert!(err.user_message().starts_with("Error: Storage error"), "got {}", err.user_message());
    assert_eq!(store.count(Collection::MoneyTransactions).unwrap(), 0);
    assert_eq!(store.count(Collection::Counterparties).unwrap(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_insert_does_not_leave_a_new_counterparty() {
    let store = store_without_table("item_transactions");

    let draft = TransactionForm::item("Bob", "Tent", Direction::Lend).validate().unwrap();
    assert!(crud::add_transaction(&store, draft, fixed_now()).is_err());

    assert!(store.find_counterparty_by_name("Bob").unwrap().is_none());
    assert_eq!(store.count(Collection::Counterparties).unwrap(), 0);
}

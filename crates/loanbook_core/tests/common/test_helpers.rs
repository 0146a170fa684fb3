//! Shared helpers: fresh stores, fixed clock, form shortcuts.

use chrono::{DateTime, TimeZone, Utc};
use loanbook_core::crud::{self, AddedTransaction};
use loanbook_core::{Direction, Storage, TransactionForm};

pub fn memory_store() -> Storage {
    Storage::open_in_memory().expect("open in-memory store")
}

/// Store on disk in a temp dir. Keep the `TempDir` alive for the test's duration.
pub fn temp_store() -> (tempfile::TempDir, Storage) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Storage::open(dir.path()).expect("open store");
    (dir, store)
}

pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
}

pub fn add_money(store: &Storage, name: &str, amount: &str, currency: &str, direction: Direction) -> AddedTransaction {
    let draft = TransactionForm::money(name, amount, currency, direction)
        .validate()
        .expect("valid money form");
    crud::add_transaction(store, draft, fixed_now()).expect("add money transaction")
}

pub fn add_item(store: &Storage, name: &str, item: &str, direction: Direction) -> AddedTransaction {
    let draft = TransactionForm::item(name, item, direction)
        .validate()
        .expect("valid item form");
    crud::add_transaction(store, draft, fixed_now()).expect("add item transaction")
}

/// Migrated in-memory store whose `table` has been dropped, so writes to it fail.
pub fn store_without_table(table: &str) -> Storage {
    let mut conn = rusqlite::Connection::open_in_memory().expect("open connection");
    loanbook_core::migrations::migrate(&mut conn).expect("migrate");
    conn.execute_batch(&format!("DROP TABLE {}", table)).expect("drop table");
    Storage::from_connection(conn).expect("wrap connection")
}

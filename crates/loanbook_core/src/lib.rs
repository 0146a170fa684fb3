//! Loanbook core: local ledger of money and items lent to or borrowed from
//! counterparties.
//!
//! The crate-level functions below are the host-facing surface. They work on one
//! process-wide store set up by [`init_storage`], and report failures as messages
//! ready to show to the user. The modules underneath take an explicit [`Storage`]
//! and return [`LedgerError`].

use once_cell::sync::Lazy;
use std::sync::{Arc, RwLock};

pub mod config;
pub mod crud;
pub mod error;
pub mod form;
pub mod ids;
pub mod ledger;
pub mod log_bridge;
pub mod migrations;
pub mod models;
pub mod notify;
pub mod storage;

pub use config::LedgerConfig;
pub use crud::{AddedId, AddedTransaction};
pub use error::{LedgerError, LedgerResult, ValidationError};
pub use form::{TransactionDraft, TransactionForm};
pub use ids::{CounterpartyId, ItemTransactionId, MoneyTransactionId};
pub use ledger::{CounterpartyLabel, CurrencyTotals, LedgerView, LoanEntry, Snapshot, Totals};
pub use log_bridge::drain_logs;
pub use models::{AssetKind, Collection, Counterparty, Direction, ItemTransaction, MoneyTransaction};
pub use notify::{LiveQuery, Subscription};
pub use storage::Storage;

struct Ledger {
    store: Storage,
    config: LedgerConfig,
}

static LEDGER: Lazy<RwLock<Option<Arc<Ledger>>>> = Lazy::new(|| RwLock::new(None));

fn current() -> LedgerResult<Arc<Ledger>> {
    let guard = LEDGER.read().unwrap_or_else(|e| e.into_inner());
    guard.clone().ok_or(LedgerError::NotInitialized)
}

/// Run `f` against the initialised ledger; any failure is logged and turned into the
/// message for the user.
fn with_ledger<T>(op: &str, f: impl FnOnce(&Ledger) -> LedgerResult<T>) -> Result<T, String> {
    current().and_then(|l| f(&l)).map_err(|e| {
        if e.is_validation() {
            ledger_log!("{} rejected: {}", op, e);
        } else {
            ledger_log!(warn: "{} failed: {}", op, e);
        }
        e.user_message()
    })
}

/// Open the store in `config.data_dir`, migrating it if needed. Replaces any store
/// opened earlier.
pub fn init_storage(config: LedgerConfig) -> Result<(), String> {
    config.validate().map_err(|e| format!("Error: invalid configuration: {:#}", e))?;
    let store = Storage::open(&config.data_dir).map_err(|e| {
        ledger_log!(warn: "init_storage failed: {}", e);
        e.user_message()
    })?;
    ledger_log!("init_storage OK dir={:?}", config.data_dir);
    let mut guard = LEDGER.write().unwrap_or_else(|e| e.into_inner());
    *guard = Some(Arc::new(Ledger { store, config }));
    Ok(())
}

/// [`init_storage`] with [`LedgerConfig::from_env`].
pub fn init_from_env() -> Result<(), String> {
    let config = LedgerConfig::from_env().map_err(|e| format!("Error: invalid configuration: {:#}", e))?;
    init_storage(config)
}

pub fn is_ready() -> bool {
    LEDGER.read().map(|g| g.is_some()).unwrap_or(false)
}

/// Drop the process-wide store. Later calls fail until [`init_storage`] runs again.
pub fn close_storage() {
    let mut guard = LEDGER.write().unwrap_or_else(|e| e.into_inner());
    *guard = None;
}

// --- Form ---

/// Empty form for `kind`, with the preferred currency pre-selected.
pub fn new_form(kind: AssetKind) -> Result<TransactionForm, String> {
    with_ledger("new_form", |l| {
        let mut form = TransactionForm::default();
        form.switch_kind(kind, &crud::preferred_currency(&l.store, &l.config.default_currency)?);
        Ok(form)
    })
}

pub fn offered_currencies() -> Result<Vec<String>, String> {
    with_ledger("offered_currencies", |l| Ok(l.config.currencies.clone()))
}

pub fn add_transaction(form: &TransactionForm) -> Result<AddedTransaction, String> {
    with_ledger("add_transaction", |l| {
        let draft = form.validate_with_default_currency(&l.config.default_currency)?;
        crud::add_transaction(&l.store, draft, chrono::Utc::now())
    })
}

// --- Delete (ids as shown to the user) ---

pub fn delete_money_transaction(id: &str) -> Result<(), String> {
    with_ledger("delete_money_transaction", |l| {
        let id = MoneyTransactionId::parse(id).map_err(LedgerError::InvalidId)?;
        crud::delete_money_transaction(&l.store, id)
    })
}

pub fn delete_item_transaction(id: &str) -> Result<(), String> {
    with_ledger("delete_item_transaction", |l| {
        let id = ItemTransactionId::parse(id).map_err(LedgerError::InvalidId)?;
        crud::delete_item_transaction(&l.store, id)
    })
}

// --- View ---

pub fn get_view() -> Result<LedgerView, String> {
    with_ledger("get_view", |l| crud::load_view(&l.store))
}

pub fn get_counterparties() -> Result<Vec<Counterparty>, String> {
    with_ledger("get_counterparties", |l| l.store.list::<Counterparty>())
}

/// Live view: signals after each change to a transaction or counterparty collection.
pub fn watch_changes() -> Result<LiveQuery, String> {
    with_ledger("watch_changes", |l| Ok(l.store.watch(&Collection::ALL)))
}

pub fn subscribe<F>(collection: Collection, callback: F) -> Result<Subscription, String>
where
    F: Fn(Collection) + Send + Sync + 'static,
{
    with_ledger("subscribe", |l| Ok(l.store.subscribe(collection, callback)))
}

//! SQLite document store: one table per collection, each row an id plus the JSON draft.
//! All access goes through one connection behind a mutex, so every mutation is an
//! atomic unit. Observers are notified after the lock is released.

use crate::error::{LedgerError, LedgerResult, ValidationError};
use crate::ledger::Snapshot;
use crate::ledger_log;
use crate::migrations;
use crate::ids::CounterpartyId;
use crate::models::{Collection, Counterparty, Document, ItemTransaction, MoneyTransaction, NewCounterparty};
use crate::notify::{ChangeHub, LiveQuery, Subscription};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

pub const DB_FILE_NAME: &str = "loanbook.db";

pub struct Storage {
    conn: Mutex<Connection>,
    hub: ChangeHub,
}

impl Storage {
    /// Open (or create) `loanbook.db` inside `dir` and bring its schema up to date.
    pub fn open(dir: impl AsRef<Path>) -> LedgerResult<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db_path = dir.join(DB_FILE_NAME);
        ledger_log!("storage::open dir={:?} db={:?}", dir, db_path);
        let conn = Connection::open(&db_path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> LedgerResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Wrap an existing connection, applying pending migrations first.
    pub fn from_connection(mut conn: Connection) -> LedgerResult<Self> {
        if migrations::migrate(&mut conn)? {
            ledger_log!("storage: schema now at version {}", migrations::current_version(&conn)?);
        }
        Ok(Self {
            conn: Mutex::new(conn),
            hub: ChangeHub::new(),
        })
    }

    fn with_db<F, T>(&self, f: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut Connection) -> LedgerResult<T>,
    {
        // SQLite rolls back unfinished statements, so a poisoned lock is still usable.
        let mut conn = self.conn.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut conn)
    }

    // Notifications

    pub fn changes(&self) -> &ChangeHub {
        &self.hub
    }

    pub fn subscribe<F>(&self, collection: Collection, callback: F) -> Subscription
    where
        F: Fn(Collection) + Send + Sync + 'static,
    {
        self.hub.subscribe(collection, callback)
    }

    pub fn watch(&self, collections: &[Collection]) -> LiveQuery {
        self.hub.watch(collections)
    }

    // Collections

    pub fn add<T: Document>(&self, draft: &T::Draft) -> LedgerResult<T::Id> {
        let doc = serde_json::to_string(draft)?;
        let table = T::COLLECTION.as_str();
        let id = self.with_db(|conn| {
            conn.execute(&format!("INSERT INTO {} (doc) VALUES (?1)", table), params![doc])?;
            Ok(conn.last_insert_rowid())
        })?;
        ledger_log!("storage::add collection={} id={}", table, id);
        self.hub.notify(T::COLLECTION);
        Ok(T::Id::from(id))
    }

    pub fn get<T: Document>(&self, id: T::Id) -> LedgerResult<Option<T>> {
        self.with_db(|conn| read_one::<T>(conn, id))
    }

    pub fn list<T: Document>(&self) -> LedgerResult<Vec<T>> {
        self.with_db(|conn| read_all::<T>(conn))
    }

    /// Remove the record if present. Absent ids succeed without touching anything.
    pub fn delete<T: Document>(&self, id: T::Id) -> LedgerResult<()> {
        let table = T::COLLECTION.as_str();
        let raw: i64 = id.into();
        let affected = self.with_db(|conn| {
            Ok(conn.execute(&format!("DELETE FROM {} WHERE id = ?1", table), params![raw])?)
        })?;
        if affected == 0 {
            ledger_log!(debug: "storage::delete collection={} id={} not present", table, raw);
            return Ok(());
        }
        ledger_log!("storage::delete collection={} id={}", table, raw);
        self.hub.notify(T::COLLECTION);
        Ok(())
    }

    pub fn count(&self, collection: Collection) -> LedgerResult<i64> {
        self.with_db(|conn| {
            Ok(conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", collection.as_str()),
                [],
                |row| row.get(0),
            )?)
        })
    }

    pub fn counts(&self) -> LedgerResult<Vec<(Collection, i64)>> {
        Collection::ALL
            .iter()
            .map(|c| self.count(*c).map(|n| (*c, n)))
            .collect()
    }

    /// All three collections read inside one transaction, so the view never mixes
    /// states from before and after a mutation.
    pub fn snapshot(&self) -> LedgerResult<Snapshot> {
        self.with_db(|conn| {
            let tx = conn.transaction()?;
            let snapshot = Snapshot {
                money: read_all::<MoneyTransaction>(&tx)?,
                items: read_all::<ItemTransaction>(&tx)?,
                counterparties: read_all::<Counterparty>(&tx)?,
            };
            tx.commit()?;
            Ok(snapshot)
        })
    }

    // Counterparties

    pub fn find_counterparty_by_name(&self, name: &str) -> LedgerResult<Option<Counterparty>> {
        if name.trim().is_empty() {
            return Ok(None);
        }
        self.with_db(|conn| find_by_name(conn, name))
    }

    /// Return the counterparty with this name (case-insensitive), creating it if needed.
    /// The lookup and the insert run in one transaction under the connection lock.
    pub fn find_or_create_counterparty(&self, name: &str) -> LedgerResult<(Counterparty, bool)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingCounterpartyName.into());
        }
        let (counterparty, created) = self.with_db(|conn| {
            let tx = conn.transaction()?;
            let found = find_or_insert_by_name(&tx, name)?;
            tx.commit()?;
            Ok(found)
        })?;
        if created {
            ledger_log!("storage::add counterparty id={} name={:?}", counterparty.id, counterparty.name);
            self.hub.notify(Collection::Counterparties);
        }
        Ok((counterparty, created))
    }

    /// Find or create the counterparty `name`, insert the record built for it and write
    /// `remember` into config, all in one transaction. On any failure nothing is kept
    /// and nobody is notified.
    pub fn add_for_counterparty<T: Document>(
        &self,
        name: &str,
        build: impl FnOnce(CounterpartyId) -> T::Draft,
        remember: Option<(&str, &str)>,
    ) -> LedgerResult<(T::Id, Counterparty, bool)> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::MissingCounterpartyName.into());
        }
        let table = T::COLLECTION.as_str();
        let (id, counterparty, created) = self.with_db(|conn| {
            let tx = conn.transaction()?;
            let (found, created) = find_or_insert_by_name(&tx, name)?;
            let counterparty = read_one::<Counterparty>(&tx, found.id)?
                .ok_or_else(|| LedgerError::CounterpartyUnresolved { name: name.to_string() })?;
            let doc = serde_json::to_string(&build(counterparty.id))?;
            tx.execute(&format!("INSERT INTO {} (doc) VALUES (?1)", table), params![doc])?;
            let id = tx.last_insert_rowid();
            if let Some((key, value)) = remember {
                write_config(&tx, key, value)?;
            }
            tx.commit()?;
            Ok((id, counterparty, created))
        })?;
        if created {
            ledger_log!("storage::add counterparty id={} name={:?}", counterparty.id, counterparty.name);
            self.hub.notify(Collection::Counterparties);
        }
        ledger_log!("storage::add collection={} id={}", table, id);
        self.hub.notify(T::COLLECTION);
        Ok((T::Id::from(id), counterparty, created))
    }

    // Config

    pub fn config_get(&self, key: &str) -> LedgerResult<Option<String>> {
        self.with_db(|conn| {
            Ok(conn
                .query_row("SELECT value FROM config WHERE key = ?1", params![key], |row| row.get(0))
                .optional()?)
        })
    }

    pub fn config_set(&self, key: &str, value: &str) -> LedgerResult<()> {
        self.with_db(|conn| write_config(conn, key, value))
    }
}

fn read_all<T: Document>(conn: &Connection) -> LedgerResult<Vec<T>> {
    let mut stmt = conn.prepare(&format!("SELECT id, doc FROM {} ORDER BY id", T::COLLECTION.as_str()))?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    rows.into_iter()
        .map(|(id, doc)| Ok(T::from_draft(T::Id::from(id), serde_json::from_str(&doc)?)))
        .collect()
}

fn read_one<T: Document>(conn: &Connection, id: T::Id) -> LedgerResult<Option<T>> {
    let raw: i64 = id.into();
    let doc: Option<String> = conn
        .query_row(
            &format!("SELECT doc FROM {} WHERE id = ?1", T::COLLECTION.as_str()),
            params![raw],
            |row| row.get(0),
        )
        .optional()?;
    match doc {
        Some(doc) => Ok(Some(T::from_draft(id, serde_json::from_str(&doc)?))),
        None => Ok(None),
    }
}

fn find_by_name(conn: &Connection, name: &str) -> LedgerResult<Option<Counterparty>> {
    let all = read_all::<Counterparty>(conn)?;
    Ok(all.into_iter().find(|c| c.has_name(name)))
}

/// Caller holds the transaction; `name` is already trimmed and non-empty.
fn find_or_insert_by_name(conn: &Connection, name: &str) -> LedgerResult<(Counterparty, bool)> {
    if let Some(existing) = find_by_name(conn, name)? {
        return Ok((existing, false));
    }
    let draft = NewCounterparty::named(name);
    conn.execute(
        "INSERT INTO counterparties (doc) VALUES (?1)",
        params![serde_json::to_string(&draft)?],
    )?;
    let id = conn.last_insert_rowid();
    Ok((Counterparty::from_draft(id.into(), draft), true))
}

fn write_config(conn: &Connection, key: &str, value: &str) -> LedgerResult<()> {
    conn.execute(
        "INSERT INTO config (key, value) VALUES (?1, ?2) ON CONFLICT(key) DO UPDATE SET value = ?2",
        params![key, value],
    )?;
    Ok(())
}

//! Schema migrations. The applied version lives in `PRAGMA user_version`.
//!
//! A migration may carry DDL and a pure per-document upgrade bound to one collection;
//! the upgrade is applied once to every existing document of that collection when the
//! version advances.

use crate::error::{LedgerError, LedgerResult};
use crate::ledger_log;
use crate::models::{Collection, DEFAULT_CURRENCY};
use rusqlite::{params, Connection};
use serde_json::Value;

pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub ddl: Option<&'static str>,
    pub upgrade: Option<(Collection, fn(Value) -> Value)>,
}

const INITIAL_COLLECTIONS: &str = r#"
CREATE TABLE IF NOT EXISTS config (key TEXT PRIMARY KEY, value TEXT);
CREATE TABLE IF NOT EXISTS money_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS item_transactions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS counterparties (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    doc TEXT NOT NULL
);
"#;

pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "initial-collections",
        ddl: Some(INITIAL_COLLECTIONS),
        upgrade: None,
    },
    Migration {
        version: 2,
        name: "money-currency",
        ddl: None,
        upgrade: Some((Collection::MoneyTransactions, backfill_currency as fn(Value) -> Value)),
    },
    Migration {
        version: 3,
        name: "counterparty-defaults",
        ddl: None,
        upgrade: Some((Collection::Counterparties, backfill_counterparty_defaults as fn(Value) -> Value)),
    },
];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Money documents from before currencies were tracked get the default currency.
pub fn backfill_currency(mut doc: Value) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        let missing = !matches!(obj.get("currency"), Some(Value::String(_)));
        if missing {
            obj.insert("currency".to_string(), Value::String(DEFAULT_CURRENCY.to_string()));
        }
    }
    doc
}

pub fn backfill_counterparty_defaults(mut doc: Value) -> Value {
    if let Some(obj) = doc.as_object_mut() {
        if !matches!(obj.get("is_person"), Some(Value::Bool(_))) {
            obj.insert("is_person".to_string(), Value::Bool(true));
        }
        obj.entry("contact_info").or_insert(Value::Null);
    }
    doc
}

pub fn current_version(conn: &Connection) -> LedgerResult<u32> {
    let v: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(v.max(0) as u32)
}

/// Apply every migration newer than the stored version. Returns true if anything ran.
pub fn migrate(conn: &mut Connection) -> LedgerResult<bool> {
    migrate_to(conn, latest_version())
}

/// Apply migrations up to and including `target`.
pub fn migrate_to(conn: &mut Connection, target: u32) -> LedgerResult<bool> {
    let prev = current_version(conn)?;
    let mut ran = false;
    for m in MIGRATIONS.iter().filter(|m| m.version > prev && m.version <= target) {
        ledger_log!("migration {} ({}) starting", m.version, m.name);
        apply(conn, m).map_err(|e| LedgerError::Migration {
            version: m.version,
            name: m.name,
            reason: e.to_string(),
        })?;
        ledger_log!("migration {} ({}) done", m.version, m.name);
        ran = true;
    }
    Ok(ran)
}

fn apply(conn: &mut Connection, m: &Migration) -> LedgerResult<()> {
    // Dropping the transaction without commit rolls it back.
    let tx = conn.transaction()?;
    if let Some(ddl) = m.ddl {
        tx.execute_batch(ddl)?;
    }
    if let Some((collection, upgrade)) = m.upgrade {
        let table = collection.as_str();
        let rows: Vec<(i64, String)> = {
            let mut stmt = tx.prepare(&format!("SELECT id, doc FROM {} ORDER BY id", table))?;
            let mapped = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };
        let update = format!("UPDATE {} SET doc = ?1 WHERE id = ?2", table);
        for (id, doc) in &rows {
            let value: Value = serde_json::from_str(doc)?;
            let upgraded = serde_json::to_string(&upgrade(value))?;
            tx.execute(&update, params![upgraded, id])?;
        }
        ledger_log!("migration {} rewrote {} {} documents", m.version, rows.len(), table);
    }
    // Version is a trusted constant, PRAGMA does not take parameters.
    tx.execute_batch(&format!("PRAGMA user_version = {}", m.version))?;
    tx.commit()?;
    Ok(())
}

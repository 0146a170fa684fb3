//! Create/delete flows: find-or-create the counterparty, persist the transaction,
//! delete by id. Inputs are already validated drafts.

use crate::error::LedgerResult;
use crate::form::{Asset, TransactionDraft};
use crate::ids::{CounterpartyId, ItemTransactionId, MoneyTransactionId};
use crate::ledger::{self, LedgerView};
use crate::ledger_log;
use crate::models::{ItemTransaction, MoneyTransaction, NewItemTransaction, NewMoneyTransaction};
use crate::storage::Storage;
use chrono::{DateTime, Utc};

/// Config key for the currency of the last saved money transaction.
pub const LAST_CURRENCY_KEY: &str = "last_currency";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddedId {
    Money(MoneyTransactionId),
    Item(ItemTransactionId),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddedTransaction {
    pub id: AddedId,
    pub counterparty_id: CounterpartyId,
    pub counterparty_created: bool,
}

/// Save the draft together with its counterparty. The counterparty lookup or creation,
/// the insert and the remembered currency commit or fail as one unit.
pub fn add_transaction(store: &Storage, draft: TransactionDraft, now: DateTime<Utc>) -> LedgerResult<AddedTransaction> {
    let TransactionDraft {
        asset,
        direction,
        description,
        counterparty_name,
        return_by,
    } = draft;
    match asset {
        Asset::Money { amount, currency } => {
            let (id, counterparty, created) = store.add_for_counterparty::<MoneyTransaction>(
                &counterparty_name,
                |counterparty_id| NewMoneyTransaction {
                    amount,
                    currency: currency.clone(),
                    direction,
                    created_at: now,
                    description,
                    counterparty_id,
                    return_by,
                },
                Some((LAST_CURRENCY_KEY, &currency)),
            )?;
            ledger_log!(
                "crud::add_transaction money id={} {} {} {} counterparty={}",
                id, direction, amount, currency, counterparty.id
            );
            Ok(AddedTransaction {
                id: AddedId::Money(id),
                counterparty_id: counterparty.id,
                counterparty_created: created,
            })
        }
        Asset::Item { item_name } => {
            let (id, counterparty, created) = store.add_for_counterparty::<ItemTransaction>(
                &counterparty_name,
                |counterparty_id| NewItemTransaction {
                    item_name,
                    direction,
                    created_at: now,
                    description,
                    counterparty_id,
                    return_by,
                },
                None,
            )?;
            ledger_log!(
                "crud::add_transaction item id={} {} counterparty={}",
                id, direction, counterparty.id
            );
            Ok(AddedTransaction {
                id: AddedId::Item(id),
                counterparty_id: counterparty.id,
                counterparty_created: created,
            })
        }
    }
}

pub fn delete_money_transaction(store: &Storage, id: MoneyTransactionId) -> LedgerResult<()> {
    store.delete::<MoneyTransaction>(id)
}

pub fn delete_item_transaction(store: &Storage, id: ItemTransactionId) -> LedgerResult<()> {
    store.delete::<ItemTransaction>(id)
}

pub fn bulk_delete_money_transactions(store: &Storage, ids: &[MoneyTransactionId]) -> LedgerResult<()> {
    for id in ids {
        delete_money_transaction(store, *id)?;
    }
    Ok(())
}

pub fn bulk_delete_item_transactions(store: &Storage, ids: &[ItemTransactionId]) -> LedgerResult<()> {
    for id in ids {
        delete_item_transaction(store, *id)?;
    }
    Ok(())
}

pub fn load_view(store: &Storage) -> LedgerResult<LedgerView> {
    let snapshot = store.snapshot()?;
    Ok(ledger::build_view(&snapshot))
}

/// Currency to pre-select: last one used, else `fallback`.
pub fn preferred_currency(store: &Storage, fallback: &str) -> LedgerResult<String> {
    Ok(store
        .config_get(LAST_CURRENCY_KEY)?
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| fallback.to_string()))
}

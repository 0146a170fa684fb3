//! Data models for counterparties and money/item transactions.
//! Drafts (`New*`) are the stored document shape; records add the store-assigned id.

use crate::ids::{CounterpartyId, ItemTransactionId, MoneyTransactionId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Currency used for money documents written before currencies existed,
/// and for the form when nothing else is configured.
pub const DEFAULT_CURRENCY: &str = "UAH";

/// Lend: the user gave the asset away. Borrow: the user received it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Lend,
    Borrow,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Lend => "lend",
            Direction::Borrow => "borrow",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Money,
    Item,
}

/// The three persisted collections. `as_str` is also the table name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    MoneyTransactions,
    ItemTransactions,
    Counterparties,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::MoneyTransactions,
        Collection::ItemTransactions,
        Collection::Counterparties,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::MoneyTransactions => "money_transactions",
            Collection::ItemTransactions => "item_transactions",
            Collection::Counterparties => "counterparties",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A record type kept in one collection. The draft is what gets stored as JSON;
/// the id lives in the row key.
pub trait Document: Sized {
    const COLLECTION: Collection;
    type Id: Copy + From<i64> + Into<i64> + fmt::Display;
    type Draft: Serialize + DeserializeOwned;

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self;
    fn id(&self) -> Self::Id;
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCounterparty {
    pub name: String,
    #[serde(default)]
    pub contact_info: Option<String>,
    #[serde(default = "default_true")]
    pub is_person: bool,
}

impl NewCounterparty {
    /// Counterparty created on the fly from a transaction form: a person, no contact info.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact_info: None,
            is_person: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counterparty {
    pub id: CounterpartyId,
    pub name: String,
    pub contact_info: Option<String>,
    pub is_person: bool,
}

impl Counterparty {
    /// Case-insensitive name match (Unicode lowercase folding).
    pub fn has_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl Document for Counterparty {
    const COLLECTION: Collection = Collection::Counterparties;
    type Id = CounterpartyId;
    type Draft = NewCounterparty;

    fn from_draft(id: CounterpartyId, d: NewCounterparty) -> Self {
        Self {
            id,
            name: d.name,
            contact_info: d.contact_info,
            is_person: d.is_person,
        }
    }

    fn id(&self) -> CounterpartyId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewMoneyTransaction {
    pub amount: f64,
    pub currency: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub counterparty_id: CounterpartyId,
    pub return_by: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MoneyTransaction {
    pub id: MoneyTransactionId,
    pub amount: f64,
    pub currency: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub counterparty_id: CounterpartyId,
    pub return_by: Option<DateTime<Utc>>,
}

impl Document for MoneyTransaction {
    const COLLECTION: Collection = Collection::MoneyTransactions;
    type Id = MoneyTransactionId;
    type Draft = NewMoneyTransaction;

    fn from_draft(id: MoneyTransactionId, d: NewMoneyTransaction) -> Self {
        Self {
            id,
            amount: d.amount,
            currency: d.currency,
            direction: d.direction,
            created_at: d.created_at,
            description: d.description,
            counterparty_id: d.counterparty_id,
            return_by: d.return_by,
        }
    }

    fn id(&self) -> MoneyTransactionId {
        self.id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItemTransaction {
    pub item_name: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub counterparty_id: CounterpartyId,
    pub return_by: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemTransaction {
    pub id: ItemTransactionId,
    pub item_name: String,
    pub direction: Direction,
    pub created_at: DateTime<Utc>,
    pub description: Option<String>,
    pub counterparty_id: CounterpartyId,
    pub return_by: Option<DateTime<Utc>>,
}

impl Document for ItemTransaction {
    const COLLECTION: Collection = Collection::ItemTransactions;
    type Id = ItemTransactionId;
    type Draft = NewItemTransaction;

    fn from_draft(id: ItemTransactionId, d: NewItemTransaction) -> Self {
        Self {
            id,
            item_name: d.item_name,
            direction: d.direction,
            created_at: d.created_at,
            description: d.description,
            counterparty_id: d.counterparty_id,
            return_by: d.return_by,
        }
    }

    fn id(&self) -> ItemTransactionId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counterparty_draft_defaults_to_person() {
        let d: NewCounterparty = serde_json::from_str(r#"{"name":"Bank"}"#).unwrap();
        assert!(d.is_person);
        assert_eq!(d.contact_info, None);
    }

    #[test]
    fn has_name_folds_unicode_case() {
        let c = Counterparty::from_draft(CounterpartyId(1), NewCounterparty::named("Олена"));
        assert!(c.has_name("олена"));
        assert!(c.has_name(" ОЛЕНА "));
        assert!(!c.has_name("Оля"));
    }
}

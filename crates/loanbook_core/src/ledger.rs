//! Build the ledger view from store snapshots: resolve counterparties, group by
//! asset kind and direction, total money per currency. Pure functions, no store access.

use crate::ids::{CounterpartyId, ItemTransactionId, MoneyTransactionId};
use crate::ledger_log;
use crate::models::{Counterparty, Direction, ItemTransaction, MoneyTransaction};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

/// Label shown for a transaction whose counterparty no longer exists.
pub const UNKNOWN_COUNTERPARTY: &str = "Unknown";

/// Full contents of the three collections at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub money: Vec<MoneyTransaction>,
    pub items: Vec<ItemTransaction>,
    pub counterparties: Vec<Counterparty>,
}

/// What the aggregation needs from a transaction, money or item.
pub trait Loan {
    type Id: Copy + Eq + Hash;

    fn loan_id(&self) -> Self::Id;
    fn counterparty_id(&self) -> CounterpartyId;
    fn direction(&self) -> Direction;
}

impl Loan for MoneyTransaction {
    type Id = MoneyTransactionId;

    fn loan_id(&self) -> MoneyTransactionId {
        self.id
    }
    fn counterparty_id(&self) -> CounterpartyId {
        self.counterparty_id
    }
    fn direction(&self) -> Direction {
        self.direction
    }
}

impl Loan for ItemTransaction {
    type Id = ItemTransactionId;

    fn loan_id(&self) -> ItemTransactionId {
        self.id
    }
    fn counterparty_id(&self) -> CounterpartyId {
        self.counterparty_id
    }
    fn direction(&self) -> Direction {
        self.direction
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CounterpartyLabel {
    Known {
        id: CounterpartyId,
        name: String,
        contact_info: Option<String>,
        is_person: bool,
    },
    /// The referenced counterparty is not in the snapshot.
    Unknown { id: CounterpartyId },
}

impl CounterpartyLabel {
    fn from_counterparty(c: &Counterparty) -> Self {
        CounterpartyLabel::Known {
            id: c.id,
            name: c.name.clone(),
            contact_info: c.contact_info.clone(),
            is_person: c.is_person,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            CounterpartyLabel::Known { name, .. } => name,
            CounterpartyLabel::Unknown { .. } => UNKNOWN_COUNTERPARTY,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, CounterpartyLabel::Unknown { .. })
    }
}

/// Map each transaction id to its counterparty label. Missing references resolve to
/// [`CounterpartyLabel::Unknown`].
pub fn resolve_counterparties<T: Loan>(
    transactions: &[T],
    counterparties: &[Counterparty],
) -> HashMap<T::Id, CounterpartyLabel> {
    let by_id = index_counterparties(counterparties);
    transactions
        .iter()
        .map(|t| (t.loan_id(), label_for(&by_id, t.counterparty_id())))
        .collect()
}

fn index_counterparties(counterparties: &[Counterparty]) -> HashMap<CounterpartyId, &Counterparty> {
    counterparties.iter().map(|c| (c.id, c)).collect()
}

fn label_for(by_id: &HashMap<CounterpartyId, &Counterparty>, id: CounterpartyId) -> CounterpartyLabel {
    match by_id.get(&id) {
        Some(c) => CounterpartyLabel::from_counterparty(c),
        None => {
            ledger_log!(debug: "ledger: counterparty {} not found, showing as unknown", id);
            CounterpartyLabel::Unknown { id }
        }
    }
}

/// The four disjoint groups; order inside each group follows the input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LoanGroups {
    pub lent_money: Vec<MoneyTransaction>,
    pub borrowed_money: Vec<MoneyTransaction>,
    pub lent_items: Vec<ItemTransaction>,
    pub borrowed_items: Vec<ItemTransaction>,
}

impl LoanGroups {
    pub fn len(&self) -> usize {
        self.lent_money.len() + self.borrowed_money.len() + self.lent_items.len() + self.borrowed_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn split_by_direction<T: Loan + Clone>(transactions: &[T]) -> (Vec<T>, Vec<T>) {
    transactions
        .iter()
        .cloned()
        .partition(|t| t.direction() == Direction::Lend)
}

pub fn partition(money: &[MoneyTransaction], items: &[ItemTransaction]) -> LoanGroups {
    let (lent_money, borrowed_money) = split_by_direction(money);
    let (lent_items, borrowed_items) = split_by_direction(items);
    LoanGroups {
        lent_money,
        borrowed_money,
        lent_items,
        borrowed_items,
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Totals {
    pub lent: f64,
    pub borrowed: f64,
}

impl Totals {
    fn add(&mut self, direction: Direction, amount: f64) {
        match direction {
            Direction::Lend => self.lent += amount,
            Direction::Borrow => self.borrowed += amount,
        }
    }
}

/// Per-currency totals. A currency with transactions in only one direction keeps a
/// zero for the other; the per-direction summaries drop zero entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CurrencyTotals(BTreeMap<String, Totals>);

impl CurrencyTotals {
    pub fn get(&self, currency: &str) -> Option<&Totals> {
        self.0.get(currency)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn lent_summary(&self) -> BTreeMap<String, f64> {
        self.summary(|t| t.lent)
    }

    pub fn borrowed_summary(&self) -> BTreeMap<String, f64> {
        self.summary(|t| t.borrowed)
    }

    fn summary(&self, pick: impl Fn(&Totals) -> f64) -> BTreeMap<String, f64> {
        self.0
            .iter()
            .filter_map(|(currency, t)| {
                let v = pick(t);
                (v != 0.0).then(|| (currency.clone(), v))
            })
            .collect()
    }
}

pub fn sum_by_currency(money: &[MoneyTransaction]) -> CurrencyTotals {
    let mut totals: BTreeMap<String, Totals> = BTreeMap::new();
    for t in money {
        totals.entry(t.currency.clone()).or_default().add(t.direction, t.amount);
    }
    CurrencyTotals(totals)
}

/// A transaction together with its resolved counterparty.
#[derive(Clone, Debug, PartialEq)]
pub struct LoanEntry<T> {
    pub transaction: T,
    pub counterparty: CounterpartyLabel,
}

/// Everything the list view renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LedgerView {
    pub lent_money: Vec<LoanEntry<MoneyTransaction>>,
    pub borrowed_money: Vec<LoanEntry<MoneyTransaction>>,
    pub lent_items: Vec<LoanEntry<ItemTransaction>>,
    pub borrowed_items: Vec<LoanEntry<ItemTransaction>>,
    pub totals: CurrencyTotals,
}

impl LedgerView {
    pub fn transaction_count(&self) -> usize {
        self.lent_money.len() + self.borrowed_money.len() + self.lent_items.len() + self.borrowed_items.len()
    }

    /// True when there is nothing to list yet.
    pub fn is_empty(&self) -> bool {
        self.transaction_count() == 0
    }
}

fn attach<T>(group: Vec<T>, labels: &mut HashMap<T::Id, CounterpartyLabel>) -> Vec<LoanEntry<T>>
where
    T: Loan,
{
    group
        .into_iter()
        .map(|t| {
            let counterparty = labels
                .remove(&t.loan_id())
                .unwrap_or(CounterpartyLabel::Unknown { id: t.counterparty_id() });
            LoanEntry { transaction: t, counterparty }
        })
        .collect()
}

pub fn build_view(snapshot: &Snapshot) -> LedgerView {
    let mut money_labels = resolve_counterparties(&snapshot.money, &snapshot.counterparties);
    let mut item_labels = resolve_counterparties(&snapshot.items, &snapshot.counterparties);
    let groups = partition(&snapshot.money, &snapshot.items);
    let totals = sum_by_currency(&snapshot.money);
    ledger_log!(debug: "ledger::build_view transactions={} currencies={}", groups.len(), totals.len());
    LedgerView {
        lent_money: attach(groups.lent_money, &mut money_labels),
        borrowed_money: attach(groups.borrowed_money, &mut money_labels),
        lent_items: attach(groups.lent_items, &mut item_labels),
        borrowed_items: attach(groups.borrowed_items, &mut item_labels),
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, NewCounterparty};
    use chrono::{TimeZone, Utc};

    fn money(id: i64, amount: f64, currency: &str, direction: Direction, cp: i64) -> MoneyTransaction {
        MoneyTransaction {
            id: MoneyTransactionId(id),
            amount,
            currency: currency.to_string(),
            direction,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            description: None,
            counterparty_id: CounterpartyId(cp),
            return_by: None,
        }
    }

    fn item(id: i64, name: &str, direction: Direction, cp: i64) -> ItemTransaction {
        ItemTransaction {
            id: ItemTransactionId(id),
            item_name: name.to_string(),
            direction,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            description: None,
            counterparty_id: CounterpartyId(cp),
            return_by: None,
        }
    }

    fn person(id: i64, name: &str) -> Counterparty {
        Counterparty::from_draft(CounterpartyId(id), NewCounterparty::named(name))
    }

    #[test]
    fn totals_are_split_by_currency_and_direction() {
        let txs = vec![
            money(1, 100.0, "UAH", Direction::Lend, 1),
            money(2, 50.0, "UAH", Direction::Borrow, 1),
            money(3, 20.0, "USD", Direction::Lend, 2),
        ];
        let totals = sum_by_currency(&txs);

        assert_eq!(totals.len(), 2);
        assert_eq!(totals.get("UAH"), Some(&Totals { lent: 100.0, borrowed: 50.0 }));
        assert_eq!(totals.get("USD"), Some(&Totals { lent: 20.0, borrowed: 0.0 }));

        let lent = totals.lent_summary();
        assert_eq!(lent.get("UAH"), Some(&100.0));
        assert_eq!(lent.get("USD"), Some(&20.0));
        let borrowed = totals.borrowed_summary();
        assert_eq!(borrowed.get("UAH"), Some(&50.0));
        assert!(!borrowed.contains_key("USD"));
    }

    #[test]
    fn empty_inputs_give_empty_results() {
        assert!(sum_by_currency(&[]).is_empty());
        assert!(partition(&[], &[]).is_empty());
        let view = build_view(&Snapshot::default());
        assert!(view.is_empty());
        assert!(view.totals.is_empty());
    }

    #[test]
    fn partition_is_exhaustive_disjoint_and_stable() {
        let money_txs = vec![
            money(1, 1.0, "UAH", Direction::Borrow, 1),
            money(2, 2.0, "UAH", Direction::Lend, 1),
            money(3, 3.0, "EUR", Direction::Borrow, 1),
            money(4, 4.0, "EUR", Direction::Lend, 1),
        ];
        let item_txs = vec![item(1, "Drill", Direction::Lend, 1), item(2, "Tent", Direction::Borrow, 2)];

        let groups = partition(&money_txs, &item_txs);

        assert_eq!(groups.len(), money_txs.len() + item_txs.len());
        let lent_ids: Vec<i64> = groups.lent_money.iter().map(|t| t.id.get()).collect();
        let borrowed_ids: Vec<i64> = groups.borrowed_money.iter().map(|t| t.id.get()).collect();
        assert_eq!(lent_ids, vec![2, 4]);
        assert_eq!(borrowed_ids, vec![1, 3]);
        assert_eq!(groups.lent_items[0].item_name, "Drill");
        assert_eq!(groups.borrowed_items[0].item_name, "Tent");
    }

    #[test]
    fn missing_counterparty_resolves_to_unknown() {
        let txs = vec![money(1, 5.0, "UAH", Direction::Lend, 1), money(2, 5.0, "UAH", Direction::Lend, 99)];
        let labels = resolve_counterparties(&txs, &[person(1, "Alice")]);

        assert_eq!(labels[&MoneyTransactionId(1)].display_name(), "Alice");
        let missing = &labels[&MoneyTransactionId(2)];
        assert!(missing.is_unknown());
        assert_eq!(missing.display_name(), UNKNOWN_COUNTERPARTY);
    }

    #[test]
    fn build_view_attaches_labels_to_each_group() {
        let snapshot = Snapshot {
            money: vec![money(1, 100.0, "UAH", Direction::Lend, 1)],
            items: vec![item(1, "Book", Direction::Borrow, 2), item(2, "Ladder", Direction::Lend, 7)],
            counterparties: vec![person(1, "Alice"), person(2, "Library")],
        };
        let view = build_view(&snapshot);

        assert_eq!(view.transaction_count(), 3);
        assert_eq!(view.lent_money[0].counterparty.display_name(), "Alice");
        assert_eq!(view.borrowed_items[0].counterparty.display_name(), "Library");
        assert!(view.lent_items[0].counterparty.is_unknown());
        assert!(view.borrowed_money.is_empty());
        assert_eq!(view.totals.get("UAH").map(|t| t.lent), Some(100.0));
    }
}

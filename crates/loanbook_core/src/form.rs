//! Add-transaction form state and its validation into a typed draft.

use crate::error::ValidationError;
use crate::models::{AssetKind, Direction, DEFAULT_CURRENCY};
use chrono::{DateTime, NaiveDate, Utc};

/// Raw form input, as typed by the user.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TransactionForm {
    /// Not chosen yet means the form body is hidden.
    pub kind: Option<AssetKind>,
    pub direction: Direction,
    pub amount: String,
    pub currency: String,
    pub item_name: String,
    pub description: String,
    pub counterparty_name: String,
    /// `YYYY-MM-DD`, empty when not set.
    pub return_date: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Asset {
    Money { amount: f64, currency: String },
    Item { item_name: String },
}

/// Validated form content, ready for the store.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionDraft {
    pub counterparty_name: String,
    pub direction: Direction,
    pub asset: Asset,
    pub description: Option<String>,
    pub return_by: Option<DateTime<Utc>>,
}

impl TransactionForm {
    pub fn money(counterparty_name: &str, amount: &str, currency: &str, direction: Direction) -> Self {
        Self {
            kind: Some(AssetKind::Money),
            direction,
            amount: amount.to_string(),
            currency: currency.to_string(),
            counterparty_name: counterparty_name.to_string(),
            ..Self::default()
        }
    }

    pub fn item(counterparty_name: &str, item_name: &str, direction: Direction) -> Self {
        Self {
            kind: Some(AssetKind::Item),
            direction,
            item_name: item_name.to_string(),
            counterparty_name: counterparty_name.to_string(),
            ..Self::default()
        }
    }

    /// Switching kind clears every field but keeps the new kind, with the currency
    /// pre-selected.
    pub fn switch_kind(&mut self, kind: AssetKind, currency: &str) {
        *self = Self {
            kind: Some(kind),
            currency: currency.to_string(),
            ..Self::default()
        };
    }

    /// Clear the fields after a successful add; the chosen kind stays.
    pub fn reset(&mut self, currency: &str) {
        if let Some(kind) = self.kind {
            self.switch_kind(kind, currency);
        }
    }

    pub fn validate(&self) -> Result<TransactionDraft, ValidationError> {
        self.validate_with_default_currency(DEFAULT_CURRENCY)
    }

    /// Checks run in a fixed order so the first problem the user sees is stable.
    pub fn validate_with_default_currency(&self, default_currency: &str) -> Result<TransactionDraft, ValidationError> {
        let counterparty_name = self.counterparty_name.trim();
        if counterparty_name.is_empty() {
            return Err(ValidationError::MissingCounterpartyName);
        }
        let amount = self.amount.trim();
        let item_name = self.item_name.trim();
        match self.kind {
            Some(AssetKind::Money) if amount.is_empty() => return Err(ValidationError::MissingAmount),
            Some(AssetKind::Item) if item_name.is_empty() => return Err(ValidationError::MissingItemName),
            None => return Err(ValidationError::MissingKind),
            _ => {}
        }
        let asset = match self.kind {
            Some(AssetKind::Money) => Asset::Money {
                amount: parse_amount(amount)?,
                currency: normalize_currency(&self.currency, default_currency),
            },
            _ => Asset::Item {
                item_name: item_name.to_string(),
            },
        };
        Ok(TransactionDraft {
            counterparty_name: counterparty_name.to_string(),
            direction: self.direction,
            asset,
            description: non_blank(&self.description),
            return_by: parse_return_date(&self.return_date)?,
        })
    }
}

fn non_blank(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

pub fn parse_amount(s: &str) -> Result<f64, ValidationError> {
    let n: f64 = s
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| ValidationError::InvalidAmount(s.to_string()))?;
    if !n.is_finite() || n <= 0.0 {
        return Err(ValidationError::InvalidAmount(s.to_string()));
    }
    Ok(n)
}

/// Trimmed upper-case code; blank falls back to `default_currency`.
pub fn normalize_currency(s: &str, default_currency: &str) -> String {
    let code = s.trim();
    if code.is_empty() {
        default_currency.trim().to_uppercase()
    } else {
        code.to_uppercase()
    }
}

/// `YYYY-MM-DD` (date input) to midnight UTC. Empty means no return date.
pub fn parse_return_date(s: &str) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let s = s.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|e| ValidationError::InvalidReturnDate(format!("{}: {}", s, e)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| ValidationError::InvalidReturnDate(s.to_string()))?;
    Ok(Some(midnight.and_utc()))
}

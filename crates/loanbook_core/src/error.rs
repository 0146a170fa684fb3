//! Errors surfaced by the ledger.
//!
//! - [`ValidationError`]: form input rejected before any store call.
//! - [`LedgerError::CounterpartyUnresolved`]: the counterparty could not be read back
//!   after find-or-create; the transaction is not written.
//! - [`LedgerError::NotInitialized`], [`LedgerError::Storage`], [`LedgerError::Io`]:
//!   the store is unavailable or rejected the operation.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter the counterparty's name.")]
    MissingCounterpartyName,
    #[error("Please enter an amount.")]
    MissingAmount,
    #[error("Please enter the item name.")]
    MissingItemName,
    #[error("Please choose money or item.")]
    MissingKind,
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid return date: {0}")]
    InvalidReturnDate(String),
}

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Could not resolve counterparty \"{name}\" after saving it")]
    CounterpartyUnresolved { name: String },
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Storage not initialized")]
    NotInitialized,
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("Malformed document: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration {version} ({name}) failed: {reason}")]
    Migration {
        version: u32,
        name: &'static str,
        reason: String,
    },
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    /// Message shown to the user. Validation errors are shown as-is; everything else
    /// is prefixed so the user can tell nothing was saved.
    pub fn user_message(&self) -> String {
        match self {
            LedgerError::Validation(e) => e.to_string(),
            other => format!("Error: {}", other),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

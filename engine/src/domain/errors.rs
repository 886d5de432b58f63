//! Error kinds returned by ledger operations.
//!
//! Every kind except `Persistence` indicates that no in-memory mutation took
//! place; the caller decides whether to retry, surface a message, or abort.
//! `Persistence` means the in-memory mutation succeeded but the store could
//! not record it — the engine does not roll that back.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Invalid monetary amount")]
    InvalidAmount,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Source and destination accounts are the same")]
    SameAccount,

    #[error("Insufficient funds")]
    InsufficientFunds,

    #[error("Client still owns active accounts")]
    HasActiveAccounts,

    #[error("Could not withdraw the capital from the source account")]
    WithdrawalFailed,

    #[error("Could not register the new fixed-term account")]
    CreationFailed,

    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl LedgerError {
    /// NotFound for a client identifier.
    pub fn client_not_found(id: &str) -> Self {
        LedgerError::NotFound(format!("client {id}"))
    }

    /// NotFound for an account number.
    pub fn account_not_found(number: &str) -> Self {
        LedgerError::NotFound(format!("account {number}"))
    }
}

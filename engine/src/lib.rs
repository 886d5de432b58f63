//! # Ledger Engine
//!
//! Core of the bank account system: clients, accounts and the transaction
//! engine that operates on them, backed by a SQLite persistence store.
//!
//! The crate is UI-agnostic. An embedding application (desktop, web, CLI)
//! maps its input onto the command types in [`domain::commands`], calls
//! [`BankService`], and renders the returned results and error kinds.
//!
//! ## Architecture
//!
//! ```text
//! Application layer (UI, batch jobs)
//!     ↓
//! Domain layer (BankService, Ledger, ClientRegistry)
//!     ↓
//! Storage layer (BankStore trait, SQLite repositories)
//! ```
//!
//! Operations mutate in-memory state first and then write through to the
//! store; the store is read back only at startup, to rebuild state.

pub mod domain;
pub mod storage;

pub use domain::{BankService, LedgerError};
pub use storage::{BankStore, SqliteStore};

use anyhow::Result;
use log::info;

/// Open the SQLite store at `database_path` and bring up a [`BankService`]
/// with the persisted state rebuilt in memory.
pub fn initialize_bank(database_path: &str) -> Result<BankService> {
    info!("Setting up the persistence store");
    let store = SqliteStore::open(database_path)?;

    info!("Rebuilding ledger state");
    let service = BankService::load(Box::new(store))?;
    Ok(service)
}

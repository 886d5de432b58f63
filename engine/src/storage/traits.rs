//! # Storage Traits
//!
//! The storage abstraction the domain layer talks to. Implementations can be
//! swapped (SQLite, another database, an in-memory fake) without touching the
//! domain. The engine calls the store after each successful in-memory
//! mutation and reads it back only once, at startup, to rebuild state.

use anyhow::Result;
use shared::{Account, Client, Movement, MovementFilter};

/// Durable storage for clients.
pub trait ClientStore: Send {
    /// Insert or replace a client keyed by its identifier.
    fn upsert_client(&self, client: &Client) -> Result<()>;

    /// Delete a client by identifier. Deleting an absent client is not an
    /// error.
    fn delete_client(&self, client_id: &str) -> Result<()>;

    /// Load every stored client.
    fn load_clients(&self) -> Result<Vec<Client>>;
}

/// Durable storage for accounts, tagged with their variant and
/// variant-specific fields.
pub trait AccountStore: Send {
    /// Insert or replace an account keyed by its number. The movement log is
    /// not part of the row; movements are stored separately.
    fn upsert_account(&self, account: &Account) -> Result<()>;

    /// Delete an account by number. Its movements are kept as history.
    fn delete_account(&self, number: &str) -> Result<()>;

    /// Load every stored account, with empty movement logs.
    fn load_accounts(&self) -> Result<Vec<Account>>;
}

/// Durable append-only storage for movements.
pub trait MovementStore: Send {
    /// Append one movement. Movements are never updated or deleted.
    fn append_movement(&self, movement: &Movement) -> Result<()>;

    /// Load movements matching `filter` in insertion order.
    fn load_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>>;
}

/// The full persistence collaborator the engine is wired with.
pub trait BankStore: ClientStore + AccountStore + MovementStore {}

impl<T: ClientStore + AccountStore + MovementStore> BankStore for T {}

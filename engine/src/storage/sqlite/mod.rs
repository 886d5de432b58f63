//! SQLite implementation of the storage traits.
//!
//! One shared connection, one repository per table, and [`SqliteStore`]
//! composing them into the full persistence collaborator the engine is wired
//! with.

pub mod account_repository;
pub mod client_repository;
pub mod db;
pub mod movement_repository;

pub use account_repository::AccountRepository;
pub use client_repository::ClientRepository;
pub use db::SqliteConnection;
pub use movement_repository::MovementRepository;

use anyhow::Result;
use shared::{Account, Client, Movement, MovementFilter};

use crate::storage::traits::{AccountStore, ClientStore, MovementStore};

/// The SQLite-backed persistence store.
pub struct SqliteStore {
    clients: ClientRepository,
    accounts: AccountRepository,
    movements: MovementRepository,
}

impl SqliteStore {
    pub fn new(connection: SqliteConnection) -> Self {
        Self {
            clients: ClientRepository::new(connection.clone()),
            accounts: AccountRepository::new(connection.clone()),
            movements: MovementRepository::new(connection),
        }
    }

    /// Open (or create) an on-disk store.
    pub fn open(path: &str) -> Result<Self> {
        Ok(Self::new(SqliteConnection::open(path)?))
    }

    /// Fresh in-memory store, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(SqliteConnection::open_in_memory()?))
    }
}

impl ClientStore for SqliteStore {
    fn upsert_client(&self, client: &Client) -> Result<()> {
        self.clients.upsert(client)
    }

    fn delete_client(&self, client_id: &str) -> Result<()> {
        self.clients.delete(client_id)
    }

    fn load_clients(&self) -> Result<Vec<Client>> {
        self.clients.load_all()
    }
}

impl AccountStore for SqliteStore {
    fn upsert_account(&self, account: &Account) -> Result<()> {
        self.accounts.upsert(account)
    }

    fn delete_account(&self, number: &str) -> Result<()> {
        self.accounts.delete(number)
    }

    fn load_accounts(&self) -> Result<Vec<Account>> {
        self.accounts.load_all()
    }
}

impl MovementStore for SqliteStore {
    fn append_movement(&self, movement: &Movement) -> Result<()> {
        self.movements.append(movement)
    }

    fn load_movements(&self, filter: &MovementFilter) -> Result<Vec<Movement>> {
        self.movements.load(filter)
    }
}

//! SQLite connection handling and schema setup.

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{anyhow, Result};
use log::info;
use rusqlite::Connection;

/// Shared handle to a SQLite database. Cheap to clone; every repository
/// created from it talks to the same underlying connection.
#[derive(Clone)]
pub struct SqliteConnection {
    inner: Arc<Mutex<Connection>>,
}

impl SqliteConnection {
    /// Open (or create) the database at `path` and make sure the schema
    /// exists.
    pub fn open(path: &str) -> Result<Self> {
        info!("Opening SQLite database at {path}");
        let conn = Connection::open(path)?;
        // WAL keeps the store readable while a write is in flight.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::setup_schema(&conn)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
        })
    }

    /// Fresh in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::setup_schema(&conn)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(conn)),
        })
    }

    fn setup_schema(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS clients (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                category TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS accounts (
                number TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                balance REAL NOT NULL,
                overdraft_limit REAL,
                maintenance_fee REAL,
                initial_capital REAL,
                annual_rate REAL,
                opened_at TEXT,
                matures_at TEXT,
                accrued_interest REAL,
                FOREIGN KEY (owner_id) REFERENCES clients (id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS movements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_number TEXT NOT NULL,
                at TEXT NOT NULL,
                kind TEXT NOT NULL,
                amount REAL NOT NULL,
                resulting_balance REAL NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Lock the underlying connection for one call.
    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("sqlite connection poisoned"))
    }
}

//! # Storage Module
//!
//! Data persistence for the ledger engine.
//!
//! The domain layer only knows the traits in [`traits`]; the concrete
//! backend lives in [`sqlite`]. The engine writes through after each
//! successful in-memory mutation and reads the store back exactly once, at
//! startup, to rebuild state.

pub mod sqlite;
pub mod traits;

pub use sqlite::{SqliteConnection, SqliteStore};
pub use traits::{AccountStore, BankStore, ClientStore, MovementStore};

//! # Domain Module
//!
//! Business logic of the bank ledger: the client registry, the account
//! ledger with its monetary operations, and the service layer that wires
//! them to a persistence store.
//!
//! ## Module Organization
//!
//! - **client_registry**: the set of registered clients and their lifecycle
//! - **ledger**: the account registry, eligibility delegation, transfers,
//!   fixed-term creation, interest accrual, aggregates and movement queries
//! - **bank_service**: the synchronous call surface over registry + ledger +
//!   store
//! - **report_service**: on-demand aggregate reports
//! - **commands**: command/result types for every operation
//! - **errors**: the error kinds every operation can return
//!
//! ## Key Rules
//!
//! - Identifiers and account numbers are globally unique
//! - A savings balance never goes below zero; a checking balance never goes
//!   below the negated overdraft limit; fixed-term funds are locked until
//!   maturity
//! - Every balance change appends exactly one movement carrying the
//!   resulting balance
//! - A client leaves the registry only once it owns no accounts

pub mod bank_service;
pub mod client_registry;
pub mod commands;
pub mod errors;
pub mod ledger;
pub mod report_service;

pub use bank_service::BankService;
pub use client_registry::ClientRegistry;
pub use commands::*;
pub use errors::LedgerError;
pub use ledger::{FixedTermReceipt, Ledger, TransferReceipt};
pub use report_service::ReportService;

//! The account ledger: the authoritative in-memory registry of accounts and
//! the transaction engine that operates on them.
//!
//! The ledger validates cross-cutting conditions (existence, same/different
//! owner), delegates eligibility to the account variant, mutates balances and
//! appends movements. Persistence is not its concern; the service layer
//! forwards successful mutations to the store.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{error, info};
use shared::{Account, AccountVariant, LedgerConfig, Movement, MovementFilter};

use crate::domain::errors::LedgerError;

/// Movements produced by a successful transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    /// Commission charged to the source, zero when both accounts share an
    /// owner.
    pub commission: f64,
    pub fee: Option<Movement>,
    pub outgoing: Movement,
    pub incoming: Movement,
}

/// Movements produced by a successful fixed-term creation. Both refer to the
/// same capital leaving the source account once; callers must not
/// double-count them.
#[derive(Debug, Clone)]
pub struct FixedTermReceipt {
    /// Number of the newly created fixed-term account.
    pub account_number: String,
    pub withdrawal: Movement,
    pub creation: Movement,
}

/// Account registry plus the monetary operations and aggregate figures over
/// it. Holds the tunable parameters; every operation reads them at call time.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: BTreeMap<String, Account>,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        Self {
            accounts: BTreeMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: LedgerConfig) {
        info!(
            "Updating ledger parameters: rate={}, checking fee={}, commission={}",
            config.fixed_term_annual_rate,
            config.checking_maintenance_fee,
            config.transfer_commission
        );
        self.config = config;
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Add an account. Fails with `DuplicateKey` if the number is taken; the
    /// registry is left unchanged in that case.
    pub fn open(&mut self, account: Account) -> Result<(), LedgerError> {
        if self.accounts.contains_key(&account.number) {
            return Err(LedgerError::DuplicateKey(format!(
                "account {}",
                account.number
            )));
        }
        info!(
            "Opening {} account {} for client {}",
            account.variant(),
            account.number,
            account.owner_id
        );
        self.accounts.insert(account.number.clone(), account);
        Ok(())
    }

    /// Remove an account unconditionally — there is no zero-balance or
    /// empty-log precondition, in contrast to client removal.
    pub fn close(&mut self, number: &str) -> Result<Account, LedgerError> {
        info!("Closing account {number}");
        self.accounts
            .remove(number)
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    pub fn account(&self, number: &str) -> Result<&Account, LedgerError> {
        self.accounts
            .get(number)
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    fn account_mut(&mut self, number: &str) -> Result<&mut Account, LedgerError> {
        self.accounts
            .get_mut(number)
            .ok_or_else(|| LedgerError::account_not_found(number))
    }

    pub fn contains(&self, number: &str) -> bool {
        self.accounts.contains_key(number)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn list_by_variant(&self, variant: AccountVariant) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.variant() == variant)
            .collect()
    }

    pub fn accounts_owned_by(&self, client_id: &str) -> Vec<&Account> {
        self.accounts
            .values()
            .filter(|a| a.owner_id == client_id)
            .collect()
    }

    // ------------------------------------------------------------------
    // Monetary operations
    // ------------------------------------------------------------------

    /// Increase an account's balance. There is no upper bound; the only
    /// failure modes are a non-positive amount and a missing account.
    pub fn deposit(&mut self, number: &str, amount: f64) -> Result<Movement, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        let account = self.account_mut(number)?;
        let movement = account.apply(Utc::now(), Movement::DEPOSIT, amount);
        info!(
            "Deposited {amount:.2} into {number}; balance is now {:.2}",
            movement.resulting_balance
        );
        Ok(movement)
    }

    /// Decrease an account's balance, subject to the variant's eligibility
    /// rule.
    pub fn withdraw(&mut self, number: &str, amount: f64) -> Result<Movement, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        let now = Utc::now();
        let account = self.account_mut(number)?;
        if !account.can_withdraw(amount, now) {
            return Err(LedgerError::InsufficientFunds);
        }
        let movement = account.apply(now, Movement::WITHDRAWAL, -amount);
        info!(
            "Withdrew {amount:.2} from {number}; balance is now {:.2}",
            movement.resulting_balance
        );
        Ok(movement)
    }

    /// Move `amount` from one account to another. Transfers between accounts
    /// of different owners additionally charge the configured commission to
    /// the source. Eligibility is checked once for `amount + commission`; if
    /// the source cannot cover the combined figure, neither account is
    /// touched.
    pub fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: f64,
    ) -> Result<TransferReceipt, LedgerError> {
        if amount <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        if from == to {
            return Err(LedgerError::SameAccount);
        }
        let now = Utc::now();
        let source_owner = self.account(from)?.owner_id.clone();
        let destination_owner = self.account(to)?.owner_id.clone();
        let commission = if source_owner != destination_owner {
            self.config.transfer_commission
        } else {
            0.0
        };

        if !self.account(from)?.can_withdraw(amount + commission, now) {
            return Err(LedgerError::InsufficientFunds);
        }

        let source = self.account_mut(from)?;
        let fee = if commission > 0.0 {
            Some(source.apply(now, Movement::TRANSFER_FEE, -commission))
        } else {
            None
        };
        let outgoing = source.apply(now, Movement::transfer_to(to), -amount);
        let incoming = self
            .account_mut(to)?
            .apply(now, Movement::transfer_from(from), amount);

        info!("Transferred {amount:.2} from {from} to {to} (commission {commission:.2})");
        Ok(TransferReceipt {
            commission,
            fee,
            outgoing,
            incoming,
        })
    }

    /// Create a fixed-term deposit funded by withdrawing `capital` from an
    /// existing account. The new account belongs to the same client, carries
    /// the currently configured annual rate, and matures `term_days` from
    /// now.
    ///
    /// The capital must not exceed the source's current balance — a stricter
    /// precondition than the variant eligibility rule, so a checking account
    /// cannot fund a deposit out of its overdraft.
    pub fn create_fixed_term(
        &mut self,
        source_number: &str,
        capital: f64,
        term_days: i64,
    ) -> Result<FixedTermReceipt, LedgerError> {
        let now = Utc::now();
        let number = fixed_term_number(now);
        self.create_fixed_term_at(source_number, capital, term_days, now, number)
    }

    fn create_fixed_term_at(
        &mut self,
        source_number: &str,
        capital: f64,
        term_days: i64,
        now: DateTime<Utc>,
        number: String,
    ) -> Result<FixedTermReceipt, LedgerError> {
        if capital <= 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        let source = self.account(source_number)?;
        if capital > source.balance {
            return Err(LedgerError::InsufficientFunds);
        }
        let owner_id = source.owner_id.clone();
        let rate = self.config.fixed_term_annual_rate;

        let withdrawal = self
            .withdraw(source_number, capital)
            .map_err(|_| LedgerError::WithdrawalFailed)?;

        let deposit = Account::fixed_term(number.clone(), owner_id, capital, rate, term_days, now);
        if self.open(deposit).is_err() {
            // Best-effort local rollback, not a two-phase commit.
            if let Err(err) = self.deposit(source_number, capital) {
                error!(
                    "Compensating deposit of {capital:.2} into {source_number} failed ({err}); \
                     the account is left short"
                );
            }
            return Err(LedgerError::CreationFailed);
        }

        let creation =
            self.account_mut(source_number)?
                .record(now, Movement::FIXED_TERM_CREATION, -capital);
        info!("Created fixed-term account {number} with capital {capital:.2} from {source_number}");
        Ok(FixedTermReceipt {
            account_number: number,
            withdrawal,
            creation,
        })
    }

    /// Credit fixed-term interest on a matured deposit. A no-op before
    /// maturity and for other variants. Returns the interest accrued so far.
    pub fn accrue_interest(&mut self, number: &str) -> Result<f64, LedgerError> {
        let now = Utc::now();
        let account = self.account_mut(number)?;
        Ok(account.accrue_interest(now))
    }

    /// Re-attach a stored movement to its account's log during startup
    /// rebuild. Returns false when the account no longer exists (its history
    /// stays in the store but has nowhere to live in memory).
    pub fn restore_movement(&mut self, movement: Movement) -> bool {
        match self.accounts.get_mut(&movement.account_number) {
            Some(account) => {
                account.movements.append(movement);
                true
            }
            None => false,
        }
    }

    // ------------------------------------------------------------------
    // Read-only surfaces
    // ------------------------------------------------------------------

    /// Whether a withdrawal would currently be permitted. A missing account
    /// reads as not eligible.
    pub fn can_withdraw(&self, number: &str, amount: f64) -> bool {
        self.accounts
            .get(number)
            .map_or(false, |a| a.can_withdraw(amount, Utc::now()))
    }

    /// Commission a transfer between the two accounts would charge right
    /// now. Zero when the owners match or either account is missing.
    pub fn transfer_commission(&self, from: &str, to: &str) -> f64 {
        match (self.accounts.get(from), self.accounts.get(to)) {
            (Some(source), Some(destination)) if source.owner_id != destination.owner_id => {
                self.config.transfer_commission
            }
            _ => 0.0,
        }
    }

    /// Quote the interest a fixed-term deposit of `capital` over `term_days`
    /// would earn at the currently configured rate.
    pub fn estimate_fixed_term_interest(&self, capital: f64, term_days: i64) -> f64 {
        capital * self.config.fixed_term_annual_rate * term_days as f64 / 365.0
    }

    pub fn total_balance(&self) -> f64 {
        self.accounts.values().map(|a| a.balance).sum()
    }

    pub fn balance_by_variant(&self, variant: AccountVariant) -> f64 {
        self.accounts
            .values()
            .filter(|a| a.variant() == variant)
            .map(|a| a.balance)
            .sum()
    }

    pub fn count_by_variant(&self, variant: AccountVariant) -> usize {
        self.accounts
            .values()
            .filter(|a| a.variant() == variant)
            .count()
    }

    pub fn total_overdraft_in_use(&self) -> f64 {
        self.accounts.values().map(|a| a.overdraft_in_use()).sum()
    }

    /// Lazy, restartable pass over every movement matching `filter`, account
    /// by account in registry order, chronological within each account.
    pub fn movements<'a>(
        &'a self,
        filter: &'a MovementFilter,
    ) -> impl Iterator<Item = &'a Movement> + 'a {
        self.accounts
            .values()
            .flat_map(move |account| account.movements.query(filter))
    }
}

/// Number for a new fixed-term account, derived from the creation timestamp.
/// The prefix keeps it out of the ordinary account-number space.
fn fixed_term_number(now: DateTime<Utc>) -> String {
    format!("FT{}", now.format("%Y%m%d%H%M%S"))
}

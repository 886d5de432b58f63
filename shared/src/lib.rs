use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a bank client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientCategory {
    /// A natural person.
    Individual,
    /// A company or other legal entity.
    Organization,
}

impl ClientCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClientCategory::Individual => "individual",
            ClientCategory::Organization => "organization",
        }
    }

    /// Parse the stored tag back into a category.
    pub fn parse(tag: &str) -> Option<ClientCategory> {
        match tag {
            "individual" => Some(ClientCategory::Individual),
            "organization" => Some(ClientCategory::Organization),
            _ => None,
        }
    }
}

impl fmt::Display for ClientCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bank client.
///
/// The identifier (e.g. a national ID) never changes once registered; the
/// display name may be corrected later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    /// Unique identifier across all clients.
    pub id: String,
    /// Display name.
    pub name: String,
    pub category: ClientCategory,
}

impl Client {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: ClientCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
        }
    }

    pub fn is_organization(&self) -> bool {
        self.category == ClientCategory::Organization
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}) - {}", self.name, self.id, self.category)
    }
}

/// Discriminant of an account variant, used for filtered listings and for
/// tagging persisted rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountVariant {
    Savings,
    Checking,
    FixedTerm,
}

impl AccountVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountVariant::Savings => "savings",
            AccountVariant::Checking => "checking",
            AccountVariant::FixedTerm => "fixed_term",
        }
    }

    pub fn parse(tag: &str) -> Option<AccountVariant> {
        match tag {
            "savings" => Some(AccountVariant::Savings),
            "checking" => Some(AccountVariant::Checking),
            "fixed_term" => Some(AccountVariant::FixedTerm),
            _ => None,
        }
    }
}

impl fmt::Display for AccountVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Variant-specific state of an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AccountKind {
    /// Savings account; the balance never goes below zero.
    Savings,
    /// Checking account; the balance may go negative down to the overdraft
    /// limit.
    Checking {
        /// How far below zero the balance is allowed to go (non-negative).
        overdraft_limit: f64,
        /// Monthly maintenance fee stamped at open time. Later configuration
        /// changes do not touch accounts that are already open.
        maintenance_fee: f64,
    },
    /// Fixed-term deposit; funds are locked until maturity.
    FixedTerm {
        /// Capital the deposit was created with. Fixed at creation.
        initial_capital: f64,
        /// Annual interest rate as a decimal fraction (0.10 = 10%).
        annual_rate: f64,
        opened_at: DateTime<Utc>,
        matures_at: DateTime<Utc>,
        /// Interest credited at/after maturity. Zero until then.
        accrued_interest: f64,
    },
}

/// A bank account.
///
/// `owner_id` is a non-owning reference into the client registry; clients and
/// accounts have independent lifecycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Unique account number across all variants.
    pub number: String,
    /// Identifier of the owning client.
    pub owner_id: String,
    /// Current balance. Signed; the floor depends on the variant.
    pub balance: f64,
    pub kind: AccountKind,
    /// Append-only audit trail of balance changes.
    pub movements: MovementLog,
}

impl Account {
    pub fn savings(number: impl Into<String>, owner_id: impl Into<String>, balance: f64) -> Self {
        Self {
            number: number.into(),
            owner_id: owner_id.into(),
            balance,
            kind: AccountKind::Savings,
            movements: MovementLog::new(),
        }
    }

    pub fn checking(
        number: impl Into<String>,
        owner_id: impl Into<String>,
        balance: f64,
        overdraft_limit: f64,
        maintenance_fee: f64,
    ) -> Self {
        Self {
            number: number.into(),
            owner_id: owner_id.into(),
            balance,
            kind: AccountKind::Checking {
                overdraft_limit,
                maintenance_fee,
            },
            movements: MovementLog::new(),
        }
    }

    /// Build a fixed-term deposit maturing `term_days` after `opened_at`.
    /// The balance starts at the deposited capital.
    pub fn fixed_term(
        number: impl Into<String>,
        owner_id: impl Into<String>,
        capital: f64,
        annual_rate: f64,
        term_days: i64,
        opened_at: DateTime<Utc>,
    ) -> Self {
        Self {
            number: number.into(),
            owner_id: owner_id.into(),
            balance: capital,
            kind: AccountKind::FixedTerm {
                initial_capital: capital,
                annual_rate,
                opened_at,
                matures_at: opened_at + Duration::days(term_days),
                accrued_interest: 0.0,
            },
            movements: MovementLog::new(),
        }
    }

    pub fn variant(&self) -> AccountVariant {
        match self.kind {
            AccountKind::Savings => AccountVariant::Savings,
            AccountKind::Checking { .. } => AccountVariant::Checking,
            AccountKind::FixedTerm { .. } => AccountVariant::FixedTerm,
        }
    }

    /// Whether a withdrawal of `amount` is currently permitted.
    ///
    /// Savings never go below zero, checking accounts may draw into their
    /// overdraft, and fixed-term deposits refuse any withdrawal before
    /// maturity regardless of amount.
    pub fn can_withdraw(&self, amount: f64, now: DateTime<Utc>) -> bool {
        match &self.kind {
            AccountKind::Savings => self.balance >= amount,
            AccountKind::Checking {
                overdraft_limit, ..
            } => self.balance + overdraft_limit >= amount,
            AccountKind::FixedTerm { matures_at, .. } => {
                now >= *matures_at && self.balance >= amount
            }
        }
    }

    /// Monthly maintenance cost, for reporting only; nothing deducts it
    /// automatically. Organizations get a 10% discount.
    pub fn maintenance_cost(&self, owner_category: ClientCategory) -> f64 {
        match &self.kind {
            AccountKind::Savings => {
                let base = 0.0;
                if owner_category == ClientCategory::Organization {
                    base * 0.9
                } else {
                    base
                }
            }
            AccountKind::Checking {
                maintenance_fee, ..
            } => {
                if owner_category == ClientCategory::Organization {
                    maintenance_fee * 0.9
                } else {
                    *maintenance_fee
                }
            }
            AccountKind::FixedTerm { .. } => 0.0,
        }
    }

    /// Portion of the overdraft currently drawn. Zero for anything but an
    /// overdrawn checking account.
    pub fn overdraft_in_use(&self) -> f64 {
        match self.kind {
            AccountKind::Checking { .. } => (-self.balance).max(0.0),
            _ => 0.0,
        }
    }

    /// Credit fixed-term interest once the deposit has matured.
    ///
    /// Before maturity (and for any other variant) this is a no-op. At or
    /// after maturity the balance is set to `capital + interest` where
    /// `interest = capital * rate * months / 12` and `months` is the term
    /// length in 30-day months. Recomputing yields the same value, so the
    /// call is idempotent. No movement is recorded; this is a silent balance
    /// adjustment, not a transaction.
    ///
    /// Returns the interest accrued so far.
    pub fn accrue_interest(&mut self, now: DateTime<Utc>) -> f64 {
        if let AccountKind::FixedTerm {
            initial_capital,
            annual_rate,
            opened_at,
            matures_at,
            accrued_interest,
        } = &mut self.kind
        {
            if now >= *matures_at {
                let months = (*matures_at - *opened_at).num_days() as f64 / 30.0;
                let interest = *initial_capital * *annual_rate * months / 12.0;
                self.balance = *initial_capital + interest;
                *accrued_interest = interest;
            }
            return *accrued_interest;
        }
        0.0
    }

    /// Record a movement without touching the balance. The movement snapshots
    /// the current balance as its resulting balance.
    pub fn record(&mut self, at: DateTime<Utc>, kind: impl Into<String>, amount: f64) -> Movement {
        let movement = Movement {
            account_number: self.number.clone(),
            at,
            kind: kind.into(),
            amount,
            resulting_balance: self.balance,
        };
        self.movements.append(movement.clone());
        movement
    }

    /// Apply a signed amount to the balance and record the matching movement.
    pub fn apply(&mut self, at: DateTime<Utc>, kind: impl Into<String>, amount: f64) -> Movement {
        self.balance += amount;
        self.record(at, kind, amount)
    }
}

/// A single immutable entry in an account's audit trail. Movements are never
/// edited or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    /// Number of the account the movement was recorded against.
    pub account_number: String,
    /// When the movement was recorded (UTC).
    pub at: DateTime<Utc>,
    /// Free-text label such as `DEPOSIT` or `TRANSFER_TO:<acct>`.
    pub kind: String,
    /// Signed amount applied to the balance.
    pub amount: f64,
    /// Account balance immediately after the movement was recorded.
    pub resulting_balance: f64,
}

impl Movement {
    pub const DEPOSIT: &'static str = "DEPOSIT";
    pub const WITHDRAWAL: &'static str = "WITHDRAWAL";
    pub const TRANSFER_FEE: &'static str = "TRANSFER_FEE";
    pub const FIXED_TERM_CREATION: &'static str = "FIXED_TERM_CREATION";

    /// Kind label for the outgoing side of a transfer.
    pub fn transfer_to(destination: &str) -> String {
        format!("TRANSFER_TO:{destination}")
    }

    /// Kind label for the incoming side of a transfer.
    pub fn transfer_from(source: &str) -> String {
        format!("TRANSFER_FROM:{source}")
    }
}

/// Predicates for movement queries. Range endpoints are inclusive; a `None`
/// field matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementFilter {
    pub account: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub kind: Option<String>,
}

impl MovementFilter {
    pub fn matches(&self, movement: &Movement) -> bool {
        if let Some(account) = &self.account {
            if movement.account_number != *account {
                return false;
            }
        }
        if let Some(from) = self.from {
            if movement.at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if movement.at > to {
                return false;
            }
        }
        if let Some(kind) = &self.kind {
            if movement.kind != *kind {
                return false;
            }
        }
        true
    }
}

/// Append-only, insertion-ordered record of an account's movements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovementLog {
    entries: Vec<Movement>,
}

impl MovementLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, movement: Movement) {
        self.entries.push(movement);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Movement> {
        self.entries.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Movement> {
        self.entries.iter()
    }

    /// Lazy, restartable pass over the log restricted by `filter`.
    pub fn query<'a>(
        &'a self,
        filter: &'a MovementFilter,
    ) -> impl Iterator<Item = &'a Movement> + 'a {
        self.entries.iter().filter(|m| filter.matches(m))
    }
}

/// Tunable parameters the ledger reads at operation time. Changing them
/// affects the next operation only; past movements and the parameters stamped
/// onto already-open accounts keep their values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Annual interest rate applied to newly created fixed-term deposits.
    pub fixed_term_annual_rate: f64,
    /// Monthly maintenance fee stamped onto newly opened checking accounts.
    pub checking_maintenance_fee: f64,
    /// Flat commission charged on transfers between different owners.
    pub transfer_commission: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            fixed_term_annual_rate: 0.10,
            checking_maintenance_fee: 50.0,
            transfer_commission: 50.0,
        }
    }
}

/// Aggregate figures over the current state, computed on demand and never
/// cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSummary {
    pub total_clients: usize,
    pub individual_clients: usize,
    pub organization_clients: usize,
    pub total_accounts: usize,
    pub savings_accounts: usize,
    pub checking_accounts: usize,
    pub fixed_term_accounts: usize,
    pub total_balance: f64,
    pub savings_balance: f64,
    pub checking_balance: f64,
    pub fixed_term_balance: f64,
    pub overdraft_in_use: f64,
}

/// One line of the maintenance-cost report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceCostLine {
    pub account_number: String,
    pub variant: AccountVariant,
    pub owner_id: String,
    pub monthly_cost: f64,
}

//! Domain-level command and result types.
//!
//! These structs form the synchronous call surface of [`BankService`]. The
//! embedding application (UI, batch jobs) maps its own input types to these
//! and branches on the returned error kind.
//!
//! [`BankService`]: crate::domain::bank_service::BankService

pub mod clients {
    use shared::{Client, ClientCategory};

    /// Input for registering a new client.
    #[derive(Debug, Clone)]
    pub struct RegisterClientCommand {
        pub id: String,
        pub name: String,
        pub category: ClientCategory,
    }

    /// Result of registering a client.
    #[derive(Debug, Clone)]
    pub struct RegisterClientResult {
        pub client: Client,
        pub success_message: String,
    }

    /// Input for correcting a client's display name.
    #[derive(Debug, Clone)]
    pub struct RenameClientCommand {
        pub id: String,
        pub new_name: String,
    }

    /// Result of renaming a client.
    #[derive(Debug, Clone)]
    pub struct RenameClientResult {
        pub client: Client,
        pub success_message: String,
    }
}

pub mod accounts {
    use shared::Account;

    /// Variant selection when opening an account directly. Fixed-term
    /// deposits are never opened this way; they only come out of
    /// `create_fixed_term`.
    #[derive(Debug, Clone)]
    pub enum OpenAccountKind {
        Savings,
        Checking { overdraft_limit: f64 },
    }

    /// Input for opening a new savings or checking account.
    #[derive(Debug, Clone)]
    pub struct OpenAccountCommand {
        pub number: String,
        pub owner_id: String,
        /// Starting balance; must not be negative. Defaults to zero when the
        /// caller has nothing to deposit yet.
        pub initial_balance: f64,
        pub kind: OpenAccountKind,
    }

    /// Result of opening an account.
    #[derive(Debug, Clone)]
    pub struct OpenAccountResult {
        pub account: Account,
        pub success_message: String,
    }
}

pub mod operations {
    use shared::{Account, Movement};

    /// Result of a deposit or a withdrawal.
    #[derive(Debug, Clone)]
    pub struct CashResult {
        pub movement: Movement,
        pub new_balance: f64,
    }

    /// Input for a transfer between two accounts.
    #[derive(Debug, Clone)]
    pub struct TransferCommand {
        pub from: String,
        pub to: String,
        pub amount: f64,
    }

    /// Result of a transfer. `fee` is present only when the owners differ
    /// and a commission was charged.
    #[derive(Debug, Clone)]
    pub struct TransferResult {
        pub commission: f64,
        pub fee: Option<Movement>,
        pub outgoing: Movement,
        pub incoming: Movement,
        pub success_message: String,
    }

    /// Input for creating a fixed-term deposit funded from an existing
    /// account.
    #[derive(Debug, Clone)]
    pub struct CreateFixedTermCommand {
        pub source_number: String,
        pub capital: f64,
        pub term_days: i64,
    }

    /// Result of creating a fixed-term deposit. The source account carries
    /// both `withdrawal` and `creation` movements for the same capital;
    /// callers must not double-count them.
    #[derive(Debug, Clone)]
    pub struct CreateFixedTermResult {
        pub account: Account,
        pub withdrawal: Movement,
        pub creation: Movement,
        pub success_message: String,
    }

    /// Result of crediting fixed-term interest.
    #[derive(Debug, Clone)]
    pub struct AccrueInterestResult {
        pub accrued_interest: f64,
        pub new_balance: f64,
    }
}

pub mod config {
    use shared::LedgerConfig;

    /// Input for replacing the tunable parameters. Takes effect on the next
    /// operation that reads them.
    #[derive(Debug, Clone)]
    pub struct UpdateConfigCommand {
        pub fixed_term_annual_rate: f64,
        pub checking_maintenance_fee: f64,
        pub transfer_commission: f64,
    }

    /// Result of updating the parameters.
    #[derive(Debug, Clone)]
    pub struct UpdateConfigResult {
        pub config: LedgerConfig,
        pub success_message: String,
    }
}

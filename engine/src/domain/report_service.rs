//! Aggregate reporting over the current in-memory state. Figures are summed
//! on demand and never cached.

use shared::{AccountVariant, BankSummary, ClientCategory, MaintenanceCostLine};

use crate::domain::client_registry::ClientRegistry;
use crate::domain::ledger::Ledger;

pub struct ReportService;

impl ReportService {
    /// Bank-wide headline figures: client and account counts, balances by
    /// variant, and the total overdraft currently drawn.
    pub fn summary(clients: &ClientRegistry, ledger: &Ledger) -> BankSummary {
        BankSummary {
            total_clients: clients.len(),
            individual_clients: clients.list_by_category(ClientCategory::Individual).len(),
            organization_clients: clients.list_by_category(ClientCategory::Organization).len(),
            total_accounts: ledger.len(),
            savings_accounts: ledger.count_by_variant(AccountVariant::Savings),
            checking_accounts: ledger.count_by_variant(AccountVariant::Checking),
            fixed_term_accounts: ledger.count_by_variant(AccountVariant::FixedTerm),
            total_balance: ledger.total_balance(),
            savings_balance: ledger.balance_by_variant(AccountVariant::Savings),
            checking_balance: ledger.balance_by_variant(AccountVariant::Checking),
            fixed_term_balance: ledger.balance_by_variant(AccountVariant::FixedTerm),
            overdraft_in_use: ledger.total_overdraft_in_use(),
        }
    }

    /// Per-account monthly maintenance cost. Informational only; nothing
    /// ever deducts these amounts. An account whose owner is missing from
    /// the registry is costed as an individual's.
    pub fn maintenance_costs(clients: &ClientRegistry, ledger: &Ledger) -> Vec<MaintenanceCostLine> {
        ledger
            .iter()
            .map(|account| {
                let category = clients
                    .get(&account.owner_id)
                    .map(|c| c.category)
                    .unwrap_or(ClientCategory::Individual);
                MaintenanceCostLine {
                    account_number: account.number.clone(),
                    variant: account.variant(),
                    owner_id: account.owner_id.clone(),
                    monthly_cost: account.maintenance_cost(category),
                }
            })
            .collect()
    }
}

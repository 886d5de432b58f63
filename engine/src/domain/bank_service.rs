//! The synchronous call surface of the engine.
//!
//! `BankService` wires the client registry, the ledger and the persistence
//! store together. Every mutating operation applies the in-memory change
//! first and only then writes through to the store; a store failure surfaces
//! as [`LedgerError::Persistence`] and the in-memory mutation stays applied.

use anyhow::Result;
use log::{info, warn};
use shared::{
    Account, AccountVariant, BankSummary, Client, ClientCategory, LedgerConfig,
    MaintenanceCostLine, Movement, MovementFilter,
};

use crate::domain::client_registry::ClientRegistry;
use crate::domain::commands::accounts::{OpenAccountCommand, OpenAccountKind, OpenAccountResult};
use crate::domain::commands::clients::{
    RegisterClientCommand, RegisterClientResult, RenameClientCommand, RenameClientResult,
};
use crate::domain::commands::config::{UpdateConfigCommand, UpdateConfigResult};
use crate::domain::commands::operations::{
    AccrueInterestResult, CashResult, CreateFixedTermCommand, CreateFixedTermResult,
    TransferCommand, TransferResult,
};
use crate::domain::errors::LedgerError;
use crate::domain::ledger::Ledger;
use crate::domain::report_service::ReportService;
use crate::storage::traits::BankStore;

pub struct BankService {
    clients: ClientRegistry,
    ledger: Ledger,
    store: Box<dyn BankStore>,
}

impl BankService {
    /// A service over empty in-memory state. Use [`BankService::load`] to
    /// pick up whatever the store already holds.
    pub fn new(store: Box<dyn BankStore>) -> Self {
        Self {
            clients: ClientRegistry::new(),
            ledger: Ledger::new(),
            store,
        }
    }

    /// Rebuild the in-memory state from the store. This is the only point
    /// where the engine reads the store back.
    pub fn load(store: Box<dyn BankStore>) -> Result<Self> {
        let mut service = Self::new(store);

        let clients = service.store.load_clients()?;
        info!("Loaded {} clients from the store", clients.len());
        for client in clients {
            service.clients.register(client).map_err(anyhow::Error::new)?;
        }

        let accounts = service.store.load_accounts()?;
        info!("Loaded {} accounts from the store", accounts.len());
        for account in accounts {
            service.ledger.open(account).map_err(anyhow::Error::new)?;
        }

        let movements = service.store.load_movements(&MovementFilter::default())?;
        info!("Loaded {} movements from the store", movements.len());
        for movement in movements {
            let account_number = movement.account_number.clone();
            if !service.ledger.restore_movement(movement) {
                warn!("Movement for closed account {account_number} kept in store only");
            }
        }

        Ok(service)
    }

    // ------------------------------------------------------------------
    // Clients
    // ------------------------------------------------------------------

    pub fn register_client(
        &mut self,
        command: RegisterClientCommand,
    ) -> Result<RegisterClientResult, LedgerError> {
        let client = Client::new(command.id, command.name, command.category);
        self.clients.register(client.clone())?;
        self.store.upsert_client(&client)?;
        Ok(RegisterClientResult {
            success_message: format!("Client {} registered", client.name),
            client,
        })
    }

    pub fn rename_client(
        &mut self,
        command: RenameClientCommand,
    ) -> Result<RenameClientResult, LedgerError> {
        let client = self
            .clients
            .rename(&command.id, &command.new_name)?
            .clone();
        self.store.upsert_client(&client)?;
        Ok(RenameClientResult {
            success_message: format!("Client {} renamed", client.id),
            client,
        })
    }

    /// Remove a client. Refused while the client still owns accounts.
    pub fn remove_client(&mut self, id: &str) -> Result<(), LedgerError> {
        self.clients.remove(id, &self.ledger)?;
        self.store.delete_client(id)?;
        Ok(())
    }

    pub fn client(&self, id: &str) -> Result<Client, LedgerError> {
        self.clients
            .get(id)
            .cloned()
            .ok_or_else(|| LedgerError::client_not_found(id))
    }

    pub fn clients(&self) -> Vec<Client> {
        self.clients.list()
    }

    pub fn clients_by_category(&self, category: ClientCategory) -> Vec<Client> {
        self.clients.list_by_category(category)
    }

    // ------------------------------------------------------------------
    // Accounts
    // ------------------------------------------------------------------

    /// Open a savings or checking account for a registered client. The
    /// checking maintenance fee is stamped from the current configuration.
    pub fn open_account(
        &mut self,
        command: OpenAccountCommand,
    ) -> Result<OpenAccountResult, LedgerError> {
        if command.initial_balance < 0.0 {
            return Err(LedgerError::InvalidAmount);
        }
        if !self.clients.contains(&command.owner_id) {
            return Err(LedgerError::client_not_found(&command.owner_id));
        }

        let account = match command.kind {
            OpenAccountKind::Savings => Account::savings(
                command.number,
                command.owner_id,
                command.initial_balance,
            ),
            OpenAccountKind::Checking { overdraft_limit } => Account::checking(
                command.number,
                command.owner_id,
                command.initial_balance,
                overdraft_limit,
                self.ledger.config().checking_maintenance_fee,
            ),
        };
        let number = account.number.clone();
        self.ledger.open(account)?;
        self.persist_account(&number)?;

        Ok(OpenAccountResult {
            success_message: format!("Account {number} opened"),
            account: self.account(&number)?,
        })
    }

    /// Close an account unconditionally and drop its row from the store. Its
    /// movement history stays in the store.
    pub fn close_account(&mut self, number: &str) -> Result<(), LedgerError> {
        self.ledger.close(number)?;
        self.store.delete_account(number)?;
        Ok(())
    }

    pub fn account(&self, number: &str) -> Result<Account, LedgerError> {
        self.ledger.account(number).cloned()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.ledger.iter().cloned().collect()
    }

    pub fn accounts_by_variant(&self, variant: AccountVariant) -> Vec<Account> {
        self.ledger
            .list_by_variant(variant)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn accounts_for_client(&self, client_id: &str) -> Vec<Account> {
        self.ledger
            .accounts_owned_by(client_id)
            .into_iter()
            .cloned()
            .collect()
    }

    // ------------------------------------------------------------------
    // Monetary operations
    // ------------------------------------------------------------------

    pub fn deposit(&mut self, number: &str, amount: f64) -> Result<CashResult, LedgerError> {
        let movement = self.ledger.deposit(number, amount)?;
        self.persist_account(number)?;
        self.store.append_movement(&movement)?;
        Ok(CashResult {
            new_balance: movement.resulting_balance,
            movement,
        })
    }

    pub fn withdraw(&mut self, number: &str, amount: f64) -> Result<CashResult, LedgerError> {
        let movement = self.ledger.withdraw(number, amount)?;
        self.persist_account(number)?;
        self.store.append_movement(&movement)?;
        Ok(CashResult {
            new_balance: movement.resulting_balance,
            movement,
        })
    }

    pub fn transfer(&mut self, command: TransferCommand) -> Result<TransferResult, LedgerError> {
        let receipt = self
            .ledger
            .transfer(&command.from, &command.to, command.amount)?;
        self.persist_account(&command.from)?;
        self.persist_account(&command.to)?;
        if let Some(fee) = &receipt.fee {
            self.store.append_movement(fee)?;
        }
        self.store.append_movement(&receipt.outgoing)?;
        self.store.append_movement(&receipt.incoming)?;

        Ok(TransferResult {
            commission: receipt.commission,
            fee: receipt.fee,
            outgoing: receipt.outgoing,
            incoming: receipt.incoming,
            success_message: format!(
                "Transferred {:.2} from {} to {}",
                command.amount, command.from, command.to
            ),
        })
    }

    pub fn create_fixed_term(
        &mut self,
        command: CreateFixedTermCommand,
    ) -> Result<CreateFixedTermResult, LedgerError> {
        let receipt = self.ledger.create_fixed_term(
            &command.source_number,
            command.capital,
            command.term_days,
        )?;
        self.persist_account(&command.source_number)?;
        self.persist_account(&receipt.account_number)?;
        self.store.append_movement(&receipt.withdrawal)?;
        self.store.append_movement(&receipt.creation)?;

        Ok(CreateFixedTermResult {
            success_message: format!("Fixed-term account {} created", receipt.account_number),
            account: self.account(&receipt.account_number)?,
            withdrawal: receipt.withdrawal,
            creation: receipt.creation,
        })
    }

    /// Credit fixed-term interest on a matured deposit and persist the new
    /// balance. No movement is recorded.
    pub fn accrue_interest(&mut self, number: &str) -> Result<AccrueInterestResult, LedgerError> {
        let accrued = self.ledger.accrue_interest(number)?;
        self.persist_account(number)?;
        Ok(AccrueInterestResult {
            accrued_interest: accrued,
            new_balance: self.ledger.account(number)?.balance,
        })
    }

    // ------------------------------------------------------------------
    // Read-only surfaces and configuration
    // ------------------------------------------------------------------

    pub fn can_withdraw(&self, number: &str, amount: f64) -> bool {
        self.ledger.can_withdraw(number, amount)
    }

    pub fn transfer_commission(&self, from: &str, to: &str) -> f64 {
        self.ledger.transfer_commission(from, to)
    }

    pub fn estimate_fixed_term_interest(&self, capital: f64, term_days: i64) -> f64 {
        self.ledger.estimate_fixed_term_interest(capital, term_days)
    }

    pub fn movements(&self, filter: &MovementFilter) -> Vec<Movement> {
        self.ledger.movements(filter).cloned().collect()
    }

    pub fn summary(&self) -> BankSummary {
        ReportService::summary(&self.clients, &self.ledger)
    }

    pub fn maintenance_costs(&self) -> Vec<MaintenanceCostLine> {
        ReportService::maintenance_costs(&self.clients, &self.ledger)
    }

    pub fn config(&self) -> LedgerConfig {
        self.ledger.config().clone()
    }

    /// Replace the tunable parameters. Takes effect on the next operation;
    /// accounts that are already open keep their stamped values.
    pub fn update_config(&mut self, command: UpdateConfigCommand) -> UpdateConfigResult {
        let config = LedgerConfig {
            fixed_term_annual_rate: command.fixed_term_annual_rate,
            checking_maintenance_fee: command.checking_maintenance_fee,
            transfer_commission: command.transfer_commission,
        };
        self.ledger.set_config(config.clone());
        UpdateConfigResult {
            config,
            success_message: "Parameters updated".to_string(),
        }
    }

    fn persist_account(&self, number: &str) -> Result<(), LedgerError> {
        let account = self.ledger.account(number)?;
        self.store.upsert_account(account)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::sqlite::{
        AccountRepository, ClientRepository, MovementRepository, SqliteConnection, SqliteStore,
    };
    use chrono::{Duration, Utc};

    /// Service plus a probe connection onto the same in-memory database, so
    /// tests can inspect what actually got persisted.
    fn service_with_probe() -> (BankService, SqliteConnection) {
        let connection = SqliteConnection::open_in_memory().unwrap();
        let service = BankService::new(Box::new(SqliteStore::new(connection.clone())));
        (service, connection)
    }

    fn register(service: &mut BankService, id: &str, name: &str, category: ClientCategory) {
        service
            .register_client(RegisterClientCommand {
                id: id.to_string(),
                name: name.to_string(),
                category,
            })
            .unwrap();
    }

    fn open_savings(service: &mut BankService, number: &str, owner: &str, balance: f64) {
        service
            .open_account(OpenAccountCommand {
                number: number.to_string(),
                owner_id: owner.to_string(),
                initial_balance: balance,
                kind: OpenAccountKind::Savings,
            })
            .unwrap();
    }

    #[test]
    fn register_client_writes_through_to_the_store() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);

        let stored = ClientRepository::new(connection).load_all().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "Alice");
    }

    #[test]
    fn duplicate_client_is_rejected_before_touching_the_store() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);

        let result = service.register_client(RegisterClientCommand {
            id: "111".to_string(),
            name: "Impostor".to_string(),
            category: ClientCategory::Individual,
        });
        assert!(matches!(result, Err(LedgerError::DuplicateKey(_))));

        let stored = ClientRepository::new(connection).load_all().unwrap();
        assert_eq!(stored[0].name, "Alice");
    }

    #[test]
    fn open_account_requires_a_registered_owner() {
        let (mut service, _connection) = service_with_probe();
        let result = service.open_account(OpenAccountCommand {
            number: "CA001".to_string(),
            owner_id: "ghost".to_string(),
            initial_balance: 0.0,
            kind: OpenAccountKind::Savings,
        });
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn open_account_rejects_a_negative_initial_balance() {
        let (mut service, _connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);

        let result = service.open_account(OpenAccountCommand {
            number: "CA001".to_string(),
            owner_id: "111".to_string(),
            initial_balance: -1.0,
            kind: OpenAccountKind::Savings,
        });
        assert!(matches!(result, Err(LedgerError::InvalidAmount)));
    }

    #[test]
    fn checking_fee_is_stamped_from_the_current_config() {
        let (mut service, _connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);

        let opened = service
            .open_account(OpenAccountCommand {
                number: "CC001".to_string(),
                owner_id: "111".to_string(),
                initial_balance: 0.0,
                kind: OpenAccountKind::Checking {
                    overdraft_limit: 1000.0,
                },
            })
            .unwrap();
        assert_eq!(
            opened.account.maintenance_cost(ClientCategory::Individual),
            50.0
        );

        // Raising the fee affects the next account, not the existing one.
        service.update_config(UpdateConfigCommand {
            fixed_term_annual_rate: 0.10,
            checking_maintenance_fee: 80.0,
            transfer_commission: 50.0,
        });
        let second = service
            .open_account(OpenAccountCommand {
                number: "CC002".to_string(),
                owner_id: "111".to_string(),
                initial_balance: 0.0,
                kind: OpenAccountKind::Checking {
                    overdraft_limit: 1000.0,
                },
            })
            .unwrap();
        assert_eq!(
            second.account.maintenance_cost(ClientCategory::Individual),
            80.0
        );
        assert_eq!(
            service
                .account("CC001")
                .unwrap()
                .maintenance_cost(ClientCategory::Individual),
            50.0
        );
    }

    #[test]
    fn deposit_persists_account_and_movement() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 100.0);

        let result = service.deposit("CA001", 50.0).unwrap();
        assert_eq!(result.new_balance, 150.0);

        let accounts = AccountRepository::new(connection.clone()).load_all().unwrap();
        assert_eq!(accounts[0].balance, 150.0);

        let movements = MovementRepository::new(connection)
            .load(&MovementFilter::default())
            .unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].kind, Movement::DEPOSIT);
        assert_eq!(movements[0].resulting_balance, 150.0);
    }

    #[test]
    fn failed_withdrawal_leaves_the_store_untouched() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 100.0);

        let result = service.withdraw("CA001", 500.0);
        assert!(matches!(result, Err(LedgerError::InsufficientFunds)));

        let movements = MovementRepository::new(connection.clone())
            .load(&MovementFilter::default())
            .unwrap();
        assert!(movements.is_empty());
        let accounts = AccountRepository::new(connection).load_all().unwrap();
        assert_eq!(accounts[0].balance, 100.0);
    }

    #[test]
    fn transfer_persists_both_sides_and_all_movements() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        register(&mut service, "222", "Bob", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 500.0);
        open_savings(&mut service, "CA003", "222", 0.0);

        let result = service
            .transfer(TransferCommand {
                from: "CA001".to_string(),
                to: "CA003".to_string(),
                amount: 100.0,
            })
            .unwrap();
        assert_eq!(result.commission, 50.0);

        let movements = MovementRepository::new(connection.clone())
            .load(&MovementFilter::default())
            .unwrap();
        let kinds: Vec<&str> = movements.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                Movement::TRANSFER_FEE,
                "TRANSFER_TO:CA003",
                "TRANSFER_FROM:CA001"
            ]
        );

        let accounts = AccountRepository::new(connection).load_all().unwrap();
        let balance_of = |number: &str| {
            accounts
                .iter()
                .find(|a| a.number == number)
                .map(|a| a.balance)
        };
        assert_eq!(balance_of("CA001"), Some(350.0));
        assert_eq!(balance_of("CA003"), Some(100.0));
    }

    #[test]
    fn remove_client_is_refused_while_accounts_remain() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 0.0);

        let result = service.remove_client("111");
        assert!(matches!(result, Err(LedgerError::HasActiveAccounts)));
        assert_eq!(
            ClientRepository::new(connection.clone()).load_all().unwrap().len(),
            1
        );

        service.close_account("CA001").unwrap();
        service.remove_client("111").unwrap();
        assert!(ClientRepository::new(connection.clone()).load_all().unwrap().is_empty());
        assert!(AccountRepository::new(connection).load_all().unwrap().is_empty());
    }

    #[test]
    fn fixed_term_creation_persists_source_and_new_account() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 1000.0);

        let result = service
            .create_fixed_term(CreateFixedTermCommand {
                source_number: "CA001".to_string(),
                capital: 600.0,
                term_days: 30,
            })
            .unwrap();

        let accounts = AccountRepository::new(connection.clone()).load_all().unwrap();
        assert_eq!(accounts.len(), 2);
        let stored_deposit = accounts
            .iter()
            .find(|a| a.number == result.account.number)
            .unwrap();
        assert_eq!(stored_deposit.balance, 600.0);
        assert_eq!(stored_deposit.variant(), AccountVariant::FixedTerm);

        let movements = MovementRepository::new(connection)
            .load(&MovementFilter {
                account: Some("CA001".to_string()),
                ..Default::default()
            })
            .unwrap();
        let kinds: Vec<&str> = movements.iter().map(|m| m.kind.as_str()).collect();
        assert_eq!(kinds, vec![Movement::WITHDRAWAL, Movement::FIXED_TERM_CREATION]);
    }

    #[test]
    fn accrue_interest_persists_the_new_balance() {
        let (mut service, connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);

        // Seed a matured deposit straight into the store, then reload.
        let opened = Utc::now() - Duration::days(60);
        AccountRepository::new(connection.clone())
            .upsert(&Account::fixed_term("FT1", "111", 1000.0, 0.10, 30, opened))
            .unwrap();
        let mut service = BankService::load(Box::new(SqliteStore::new(connection.clone()))).unwrap();

        let result = service.accrue_interest("FT1").unwrap();
        assert!((result.accrued_interest - 1000.0 * 0.10 / 12.0).abs() < 0.001);
        assert!((result.new_balance - 1008.3333).abs() < 0.001);

        let accounts = AccountRepository::new(connection).load_all().unwrap();
        assert!((accounts[0].balance - 1008.3333).abs() < 0.001);

        // Idempotent: a second call lands on the same figures.
        let again = service.accrue_interest("FT1").unwrap();
        assert_eq!(again.accrued_interest, result.accrued_interest);
        assert_eq!(again.new_balance, result.new_balance);
    }

    #[test]
    fn full_state_survives_a_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.db");
        let path = path.to_str().unwrap();

        {
            let mut service =
                BankService::new(Box::new(SqliteStore::open(path).unwrap()));
            register(&mut service, "111", "Alice", ClientCategory::Individual);
            register(&mut service, "20-555", "Acme Corp", ClientCategory::Organization);
            open_savings(&mut service, "CA001", "111", 500.0);
            open_savings(&mut service, "CA002", "20-555", 0.0);
            service.deposit("CA001", 100.0).unwrap();
            service
                .transfer(TransferCommand {
                    from: "CA001".to_string(),
                    to: "CA002".to_string(),
                    amount: 200.0,
                })
                .unwrap();
        }

        let service = BankService::load(Box::new(SqliteStore::open(path).unwrap())).unwrap();

        assert_eq!(service.clients().len(), 2);
        // 500 + 100 - 200 - 50 commission.
        assert_eq!(service.account("CA001").unwrap().balance, 350.0);
        assert_eq!(service.account("CA002").unwrap().balance, 200.0);

        // The movement logs came back too, in order.
        let kinds: Vec<String> = service
            .movements(&MovementFilter {
                account: Some("CA001".to_string()),
                ..Default::default()
            })
            .iter()
            .map(|m| m.kind.clone())
            .collect();
        assert_eq!(
            kinds,
            vec![
                Movement::DEPOSIT.to_string(),
                Movement::TRANSFER_FEE.to_string(),
                "TRANSFER_TO:CA002".to_string()
            ]
        );

        let summary = service.summary();
        assert_eq!(summary.total_clients, 2);
        assert_eq!(summary.total_accounts, 2);
        assert_eq!(summary.total_balance, 550.0);
    }

    #[test]
    fn previews_and_estimates_delegate_to_the_ledger() {
        let (mut service, _connection) = service_with_probe();
        register(&mut service, "111", "Alice", ClientCategory::Individual);
        register(&mut service, "222", "Bob", ClientCategory::Individual);
        open_savings(&mut service, "CA001", "111", 500.0);
        open_savings(&mut service, "CA002", "111", 0.0);
        open_savings(&mut service, "CA003", "222", 0.0);

        assert!(service.can_withdraw("CA001", 500.0));
        assert!(!service.can_withdraw("CA001", 501.0));
        assert!(!service.can_withdraw("missing", 1.0));
        assert_eq!(service.transfer_commission("CA001", "CA002"), 0.0);
        assert_eq!(service.transfer_commission("CA001", "CA003"), 50.0);
        assert!((service.estimate_fixed_term_interest(1000.0, 365) - 100.0).abs() < 1e-9);
    }
}

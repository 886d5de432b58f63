//! In-memory registry of bank clients, keyed by their unique identifier.

use std::collections::BTreeMap;

use log::info;
use shared::{Client, ClientCategory};

use crate::domain::errors::LedgerError;
use crate::domain::ledger::Ledger;

/// Owns the set of registered clients. Cross-checks against the account
/// ledger happen where an operation needs them (a client can only leave the
/// registry once it owns no accounts).
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: BTreeMap<String, Client>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new client. Fails with `DuplicateKey` if the identifier is
    /// already taken; the registry is left unchanged in that case.
    pub fn register(&mut self, client: Client) -> Result<(), LedgerError> {
        if self.clients.contains_key(&client.id) {
            return Err(LedgerError::DuplicateKey(format!("client {}", client.id)));
        }
        info!("Registering client {} ({})", client.name, client.id);
        self.clients.insert(client.id.clone(), client);
        Ok(())
    }

    /// Remove a client, provided it no longer owns any account in `ledger`.
    pub fn remove(&mut self, id: &str, ledger: &Ledger) -> Result<Client, LedgerError> {
        if !self.clients.contains_key(id) {
            return Err(LedgerError::client_not_found(id));
        }
        if !ledger.accounts_owned_by(id).is_empty() {
            return Err(LedgerError::HasActiveAccounts);
        }
        info!("Removing client {id}");
        self.clients
            .remove(id)
            .ok_or_else(|| LedgerError::client_not_found(id))
    }

    /// Correct a client's display name. The identifier never changes.
    pub fn rename(&mut self, id: &str, new_name: &str) -> Result<&Client, LedgerError> {
        let client = self
            .clients
            .get_mut(id)
            .ok_or_else(|| LedgerError::client_not_found(id))?;
        info!("Renaming client {id} to {new_name}");
        client.name = new_name.to_string();
        Ok(client)
    }

    pub fn get(&self, id: &str) -> Option<&Client> {
        self.clients.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        self.clients.values()
    }

    pub fn list(&self) -> Vec<Client> {
        self.clients.values().cloned().collect()
    }

    pub fn list_by_category(&self, category: ClientCategory) -> Vec<Client> {
        self.clients
            .values()
            .filter(|c| c.category == category)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Account;

    fn individual(id: &str, name: &str) -> Client {
        Client::new(id, name, ClientCategory::Individual)
    }

    #[test]
    fn register_rejects_duplicate_identifier() {
        let mut registry = ClientRegistry::new();
        registry.register(individual("111", "Alice")).unwrap();

        let result = registry.register(individual("111", "Someone Else"));
        assert!(matches!(result, Err(LedgerError::DuplicateKey(_))));

        // The original entry is untouched.
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("111").unwrap().name, "Alice");
    }

    #[test]
    fn remove_unknown_client_is_not_found() {
        let mut registry = ClientRegistry::new();
        let ledger = Ledger::new();

        let result = registry.remove("999", &ledger);
        assert!(matches!(result, Err(LedgerError::NotFound(_))));
    }

    #[test]
    fn remove_is_refused_while_the_client_owns_accounts() {
        let mut registry = ClientRegistry::new();
        registry.register(individual("111", "Alice")).unwrap();

        let mut ledger = Ledger::new();
        ledger.open(Account::savings("CA001", "111", 100.0)).unwrap();

        let result = registry.remove("111", &ledger);
        assert!(matches!(result, Err(LedgerError::HasActiveAccounts)));
        assert!(registry.contains("111"));

        ledger.close("CA001").unwrap();
        registry.remove("111", &ledger).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn rename_keeps_the_identifier() {
        let mut registry = ClientRegistry::new();
        registry.register(individual("111", "Alicia")).unwrap();

        let client = registry.rename("111", "Alice").unwrap();
        assert_eq!(client.id, "111");
        assert_eq!(client.name, "Alice");
    }

    #[test]
    fn list_by_category_filters() {
        let mut registry = ClientRegistry::new();
        registry.register(individual("111", "Alice")).unwrap();
        registry
            .register(Client::new("20-555", "Acme Corp", ClientCategory::Organization))
            .unwrap();

        let organizations = registry.list_by_category(ClientCategory::Organization);
        assert_eq!(organizations.len(), 1);
        assert_eq!(organizations[0].name, "Acme Corp");
        assert_eq!(registry.list().len(), 2);
    }
}

//! SQLite-backed client rows.

use anyhow::{anyhow, Result};
use rusqlite::params;
use shared::{Client, ClientCategory};

use super::db::SqliteConnection;

#[derive(Clone)]
pub struct ClientRepository {
    connection: SqliteConnection,
}

impl ClientRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    pub fn upsert(&self, client: &Client) -> Result<()> {
        let conn = self.connection.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO clients (id, name, category) VALUES (?1, ?2, ?3)",
            params![client.id, client.name, client.category.as_str()],
        )?;
        Ok(())
    }

    pub fn delete(&self, client_id: &str) -> Result<()> {
        let conn = self.connection.lock()?;
        conn.execute("DELETE FROM clients WHERE id = ?1", params![client_id])?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<Client>> {
        let conn = self.connection.lock()?;
        let mut stmt = conn.prepare("SELECT id, name, category FROM clients ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut clients = Vec::new();
        for row in rows {
            let (id, name, tag) = row?;
            let category = ClientCategory::parse(&tag)
                .ok_or_else(|| anyhow!("unknown client category tag: {tag}"))?;
            clients.push(Client::new(id, name, category));
        }
        Ok(clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository() -> ClientRepository {
        ClientRepository::new(SqliteConnection::open_in_memory().unwrap())
    }

    #[test]
    fn upsert_and_load_roundtrip() {
        let repo = repository();
        repo.upsert(&Client::new("111", "Alice", ClientCategory::Individual))
            .unwrap();
        repo.upsert(&Client::new("20-555", "Acme Corp", ClientCategory::Organization))
            .unwrap();

        let clients = repo.load_all().unwrap();
        assert_eq!(clients.len(), 2);
        assert!(clients
            .iter()
            .any(|c| c.id == "111" && c.category == ClientCategory::Individual));
        assert!(clients
            .iter()
            .any(|c| c.id == "20-555" && c.category == ClientCategory::Organization));
    }

    #[test]
    fn upsert_replaces_the_existing_row() {
        let repo = repository();
        repo.upsert(&Client::new("111", "Alicia", ClientCategory::Individual))
            .unwrap();
        repo.upsert(&Client::new("111", "Alice", ClientCategory::Individual))
            .unwrap();

        let clients = repo.load_all().unwrap();
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].name, "Alice");
    }

    #[test]
    fn delete_removes_the_row() {
        let repo = repository();
        repo.upsert(&Client::new("111", "Alice", ClientCategory::Individual))
            .unwrap();
        repo.delete("111").unwrap();
        assert!(repo.load_all().unwrap().is_empty());

        // Deleting again is not an error.
        repo.delete("111").unwrap();
    }
}

//! SQLite-backed movement rows. Append-only: there is no update or delete.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter};
use shared::{Movement, MovementFilter};

use super::db::SqliteConnection;

#[derive(Clone)]
pub struct MovementRepository {
    connection: SqliteConnection,
}

impl MovementRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    pub fn append(&self, movement: &Movement) -> Result<()> {
        let conn = self.connection.lock()?;
        conn.execute(
            "INSERT INTO movements (account_number, at, kind, amount, resulting_balance)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                movement.account_number,
                movement.at.to_rfc3339(),
                movement.kind,
                movement.amount,
                movement.resulting_balance,
            ],
        )?;
        Ok(())
    }

    /// Load movements matching `filter`, oldest first. RFC 3339 timestamps in
    /// UTC compare correctly as text, so the range clauses stay in SQL.
    pub fn load(&self, filter: &MovementFilter) -> Result<Vec<Movement>> {
        let mut sql = String::from(
            "SELECT account_number, at, kind, amount, resulting_balance
             FROM movements WHERE 1=1",
        );
        let mut bindings: Vec<String> = Vec::new();

        if let Some(account) = &filter.account {
            sql.push_str(" AND account_number = ?");
            bindings.push(account.clone());
        }
        if let Some(from) = filter.from {
            sql.push_str(" AND at >= ?");
            bindings.push(from.to_rfc3339());
        }
        if let Some(to) = filter.to {
            sql.push_str(" AND at <= ?");
            bindings.push(to.to_rfc3339());
        }
        if let Some(kind) = &filter.kind {
            sql.push_str(" AND kind = ?");
            bindings.push(kind.clone());
        }
        sql.push_str(" ORDER BY id ASC");

        let conn = self.connection.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bindings.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, f64>(3)?,
                row.get::<_, f64>(4)?,
            ))
        })?;

        let mut movements = Vec::new();
        for row in rows {
            let (account_number, at, kind, amount, resulting_balance) = row?;
            movements.push(Movement {
                account_number,
                at: parse_timestamp(&at)?,
                kind,
                amount,
                resulting_balance,
            });
        }
        Ok(movements)
    }
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow!("bad movement timestamp {raw:?}: {e}"))?
        .with_timezone(&Utc))
}

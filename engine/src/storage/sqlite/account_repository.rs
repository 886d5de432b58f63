//! SQLite-backed account rows, tagged with their variant. Variant-specific
//! fields live in nullable columns; the movement log is stored separately.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::params;
use shared::{Account, AccountKind, AccountVariant, MovementLog};

use super::db::SqliteConnection;

#[derive(Clone)]
pub struct AccountRepository {
    connection: SqliteConnection,
}

impl AccountRepository {
    pub fn new(connection: SqliteConnection) -> Self {
        Self { connection }
    }

    pub fn upsert(&self, account: &Account) -> Result<()> {
        let mut overdraft_limit = None;
        let mut maintenance_fee = None;
        let mut initial_capital = None;
        let mut annual_rate = None;
        let mut opened_at = None;
        let mut matures_at = None;
        let mut accrued_interest = None;

        match &account.kind {
            AccountKind::Savings => {}
            AccountKind::Checking {
                overdraft_limit: limit,
                maintenance_fee: fee,
            } => {
                overdraft_limit = Some(*limit);
                maintenance_fee = Some(*fee);
            }
            AccountKind::FixedTerm {
                initial_capital: capital,
                annual_rate: rate,
                opened_at: opened,
                matures_at: matures,
                accrued_interest: accrued,
            } => {
                initial_capital = Some(*capital);
                annual_rate = Some(*rate);
                opened_at = Some(opened.to_rfc3339());
                matures_at = Some(matures.to_rfc3339());
                accrued_interest = Some(*accrued);
            }
        }

        let conn = self.connection.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO accounts (
                number, owner_id, kind, balance,
                overdraft_limit, maintenance_fee,
                initial_capital, annual_rate, opened_at, matures_at, accrued_interest
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                account.number,
                account.owner_id,
                account.variant().as_str(),
                account.balance,
                overdraft_limit,
                maintenance_fee,
                initial_capital,
                annual_rate,
                opened_at,
                matures_at,
                accrued_interest,
            ],
        )?;
        Ok(())
    }

    pub fn delete(&self, number: &str) -> Result<()> {
        let conn = self.connection.lock()?;
        conn.execute("DELETE FROM accounts WHERE number = ?1", params![number])?;
        Ok(())
    }

    pub fn load_all(&self) -> Result<Vec<Account>> {
        let conn = self.connection.lock()?;
        let mut stmt = conn.prepare(
            "SELECT number, owner_id, kind, balance,
                    overdraft_limit, maintenance_fee,
                    initial_capital, annual_rate, opened_at, matures_at, accrued_interest
             FROM accounts ORDER BY number",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(AccountRow {
                number: row.get(0)?,
                owner_id: row.get(1)?,
                kind: row.get(2)?,
                balance: row.get(3)?,
                overdraft_limit: row.get(4)?,
                maintenance_fee: row.get(5)?,
                initial_capital: row.get(6)?,
                annual_rate: row.get(7)?,
                opened_at: row.get(8)?,
                matures_at: row.get(9)?,
                accrued_interest: row.get(10)?,
            })
        })?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row?.into_account()?);
        }
        Ok(accounts)
    }
}

struct AccountRow {
    number: String,
    owner_id: String,
    kind: String,
    balance: f64,
    overdraft_limit: Option<f64>,
    maintenance_fee: Option<f64>,
    initial_capital: Option<f64>,
    annual_rate: Option<f64>,
    opened_at: Option<String>,
    matures_at: Option<String>,
    accrued_interest: Option<f64>,
}

impl AccountRow {
    fn into_account(self) -> Result<Account> {
        let variant = AccountVariant::parse(&self.kind)
            .ok_or_else(|| anyhow!("unknown account kind tag: {}", self.kind))?;

        let kind = match variant {
            AccountVariant::Savings => AccountKind::Savings,
            AccountVariant::Checking => AccountKind::Checking {
                overdraft_limit: self.overdraft_limit.unwrap_or(1000.0),
                maintenance_fee: self.maintenance_fee.unwrap_or(50.0),
            },
            AccountVariant::FixedTerm => AccountKind::FixedTerm {
                initial_capital: self.initial_capital.unwrap_or(self.balance),
                annual_rate: self.annual_rate.unwrap_or(0.10),
                opened_at: parse_timestamp(self.opened_at.as_deref(), "opened_at")?,
                matures_at: parse_timestamp(self.matures_at.as_deref(), "matures_at")?,
                accrued_interest: self.accrued_interest.unwrap_or(0.0),
            },
        };

        Ok(Account {
            number: self.number,
            owner_id: self.owner_id,
            balance: self.balance,
            kind,
            movements: MovementLog::new(),
        })
    }
}

fn parse_timestamp(value: Option<&str>, column: &str) -> Result<DateTime<Utc>> {
    let raw = value.ok_or_else(|| anyhow!("fixed-term row is missing {column}"))?;
    Ok(DateTime::parse_from_rfc3339(raw)
        .map_err(|e| anyhow!("bad {column} timestamp {raw:?}: {e}"))?
        .with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn repository() -> AccountRepository {
        let connection = SqliteConnection::open_in_memory().unwrap();
        // Accounts carry a foreign key to clients; seed the owners the tests use.
        {
            let conn = connection.lock().unwrap();
            conn.execute(
                "INSERT INTO clients (id, name, category) VALUES \
                 ('111', 'Test Owner', 'individual'), \
                 ('222', 'Test Owner', 'individual')",
                [],
            )
            .unwrap();
        }
        AccountRepository::new(connection)
    }

    #[test]
    fn savings_roundtrip() {
        let repo = repository();
        repo.upsert(&Account::savings("CA001", "111", 500.0)).unwrap();

        let accounts = repo.load_all().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].number, "CA001");
        assert_eq!(accounts[0].balance, 500.0);
        assert_eq!(accounts[0].kind, AccountKind::Savings);
        assert!(accounts[0].movements.is_empty());
    }

    #[test]
    fn checking_roundtrip_keeps_variant_fields() {
        let repo = repository();
        repo.upsert(&Account::checking("CC001", "222", -300.0, 1500.0, 75.0))
            .unwrap();

        let accounts = repo.load_all().unwrap();
        assert_eq!(
            accounts[0].kind,
            AccountKind::Checking {
                overdraft_limit: 1500.0,
                maintenance_fee: 75.0,
            }
        );
        assert_eq!(accounts[0].balance, -300.0);
    }

    #[test]
    fn fixed_term_roundtrip_keeps_exact_dates() {
        let repo = repository();
        let opened = Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap();
        let mut account = Account::fixed_term("FT1", "111", 1000.0, 0.12, 60, opened);
        account.accrue_interest(opened + Duration::days(60));
        repo.upsert(&account).unwrap();

        let accounts = repo.load_all().unwrap();
        let loaded = &accounts[0];
        match &loaded.kind {
            AccountKind::FixedTerm {
                initial_capital,
                annual_rate,
                opened_at,
                matures_at,
                accrued_interest,
            } => {
                assert_eq!(*initial_capital, 1000.0);
                assert_eq!(*annual_rate, 0.12);
                assert_eq!(*opened_at, opened);
                assert_eq!(*matures_at, opened + Duration::days(60));
                assert!(*accrued_interest > 0.0);
            }
            other => panic!("expected a fixed-term account, got {other:?}"),
        }
        assert_eq!(loaded.balance, account.balance);
    }

    #[test]
    fn upsert_replaces_and_delete_removes() {
        let repo = repository();
        repo.upsert(&Account::savings("CA001", "111", 100.0)).unwrap();
        repo.upsert(&Account::savings("CA001", "111", 250.0)).unwrap();

        let accounts = repo.load_all().unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].balance, 250.0);

        repo.delete("CA001").unwrap();
        assert!(repo.load_all().unwrap().is_empty());
    }
}

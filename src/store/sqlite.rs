// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;

use super::{LedgerStore, StoreError, StoredLedger};
use crate::db;
use crate::models::{
    fmt_timestamp, parse_timestamp, Account, Category, NewAccount, Transaction, TransactionKind,
};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Ok(Self {
            conn: db::open_or_init(path)?,
        })
    }

    /// Wrap an existing connection, creating the schema if it is missing.
    pub fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        db::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

fn parse_decimal(s: &str, what: &str) -> Result<Decimal, StoreError> {
    s.parse::<Decimal>()
        .map_err(|_| StoreError::Corrupt(format!("invalid {} '{}'", what, s)))
}

fn account_from_row(r: &Row<'_>) -> rusqlite::Result<(String, String, String, String, String)> {
    Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?, r.get(4)?))
}

fn build_account(
    (user_id, user_name, password_hash, balance, created_at): (String, String, String, String, String),
) -> Result<Account, StoreError> {
    let balance = parse_decimal(&balance, "balance")?;
    let created_at = parse_timestamp(&created_at)
        .ok_or_else(|| StoreError::Corrupt(format!("invalid created_at '{}'", created_at)))?;
    Ok(Account {
        user_id,
        user_name,
        password_hash,
        balance,
        created_at,
    })
}

impl LedgerStore for SqliteStore {
    fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let inserted = self.conn.execute(
            "INSERT INTO accounts(user_id, user_name, password_hash, balance, created_at)
             VALUES (?1, ?2, ?3, '0', ?4)
             ON CONFLICT(user_name) DO NOTHING",
            params![
                account.user_id,
                account.user_name,
                account.password_hash,
                fmt_timestamp(&account.created_at)
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(account.clone().into_account())
    }

    fn find_account(&self, user_name: &str) -> Result<Option<Account>, StoreError> {
        let row = self
            .conn
            .query_row(
                "SELECT user_id, user_name, password_hash, balance, created_at
                 FROM accounts WHERE user_name=?1",
                params![user_name],
                account_from_row,
            )
            .optional()?;
        row.map(build_account).transpose()
    }

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, user_name, password_hash, balance, created_at
             FROM accounts ORDER BY user_name",
        )?;
        let rows = stmt.query_map([], account_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(build_account(row?)?);
        }
        Ok(out)
    }

    fn load(&self, user_id: &str) -> Result<StoredLedger, StoreError> {
        let balance: Option<String> = self
            .conn
            .query_row(
                "SELECT balance FROM accounts WHERE user_id=?1",
                params![user_id],
                |r| r.get(0),
            )
            .optional()?;
        let balance = balance.ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        let balance = parse_decimal(&balance, "balance")?;

        let mut stmt = self.conn.prepare(
            "SELECT id, type, amount, description, category, date
             FROM transactions WHERE user_id=?1 ORDER BY seq",
        )?;
        let mut rows = stmt.query(params![user_id])?;
        let mut transactions = Vec::new();
        while let Some(r) = rows.next()? {
            let id: String = r.get(0)?;
            let kind: String = r.get(1)?;
            let amount: String = r.get(2)?;
            let description: String = r.get(3)?;
            let category: String = r.get(4)?;
            let date: String = r.get(5)?;
            let corrupt = |what: &str, v: &str| {
                StoreError::Corrupt(format!("transaction {}: invalid {} '{}'", id, what, v))
            };
            let kind: TransactionKind = kind.parse().map_err(|_| corrupt("type", &kind))?;
            let category: Category = category.parse().map_err(|_| corrupt("category", &category))?;
            let timestamp = parse_timestamp(&date).ok_or_else(|| corrupt("date", &date))?;
            let amount = parse_decimal(&amount, "amount")?;
            transactions.push(Transaction::from_stored(
                id,
                kind,
                amount,
                description,
                category,
                timestamp,
            ));
        }
        Ok(StoredLedger {
            balance,
            transactions,
        })
    }

    fn save(
        &self,
        user_id: &str,
        balance: Decimal,
        transactions: &[Transaction],
    ) -> Result<(), StoreError> {
        // Rolls back on drop unless committed.
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE accounts SET balance=?1 WHERE user_id=?2",
            params![balance.to_string(), user_id],
        )?;
        if updated == 0 {
            return Err(StoreError::NotFound(user_id.to_string()));
        }
        tx.execute(
            "DELETE FROM transactions WHERE user_id=?1",
            params![user_id],
        )?;
        {
            let mut ins = tx.prepare_cached(
                "INSERT INTO transactions(id, user_id, seq, type, amount, description, category, date)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (seq, t) in transactions.iter().enumerate() {
                ins.execute(params![
                    t.id(),
                    user_id,
                    seq as i64,
                    t.kind().as_str(),
                    t.amount().to_string(),
                    t.description(),
                    t.category().key(),
                    fmt_timestamp(&t.timestamp()),
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(user_id, rows = transactions.len(), "ledger saved to sqlite");
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Managed cloud backend speaking the PostgREST dialect.
//!
//! Tables: `accounts(user_id, user_name unique, password_hash, balance,
//! created_at)` and `ledgers(user_id primary key, balance, transactions jsonb,
//! updated_at)`. A ledger is one row, so each save is one upsert.

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, RequestBuilder, Response};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{LedgerStore, StoreError, StoredLedger};
use crate::models::{Account, NewAccount, Transaction};

const UA: &str = concat!(
    "mizan/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/alphavelocity/mizan)"
);

#[derive(Debug, Serialize, Deserialize)]
struct LedgerRow {
    user_id: String,
    balance: Decimal,
    transactions: Vec<Transaction>,
    updated_at: DateTime<Utc>,
}

pub struct RemoteStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RemoteStore {
    pub fn new(base_url: &str, api_key: Option<&str>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .user_agent(UA)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("apikey", key).bearer_auth(key),
            None => req,
        }
    }

    fn send(&self, req: RequestBuilder) -> Result<Response, StoreError> {
        let resp = self.authed(req).send()?;
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().unwrap_or_default();
        Err(StoreError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

impl LedgerStore for RemoteStore {
    fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let row = account.clone().into_account();
        let req = self
            .client
            .post(self.table_url("accounts"))
            .query(&[("on_conflict", "user_name")])
            .header("Prefer", "resolution=ignore-duplicates,return=representation")
            .json(&[&row]);
        let created: Vec<Account> = self.send(req)?.json()?;
        // An ignored duplicate comes back as an empty representation.
        created.into_iter().next().ok_or(StoreError::Conflict)
    }

    fn find_account(&self, user_name: &str) -> Result<Option<Account>, StoreError> {
        let filter = format!("eq.{}", user_name);
        let req = self
            .client
            .get(self.table_url("accounts"))
            .query(&[("user_name", filter.as_str()), ("select", "*")]);
        let found: Vec<Account> = self.send(req)?.json()?;
        Ok(found.into_iter().next())
    }

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let req = self
            .client
            .get(self.table_url("accounts"))
            .query(&[("select", "*"), ("order", "user_name.asc")]);
        Ok(self.send(req)?.json()?)
    }

    fn load(&self, user_id: &str) -> Result<StoredLedger, StoreError> {
        let filter = format!("eq.{}", user_id);
        let req = self
            .client
            .get(self.table_url("ledgers"))
            .query(&[("user_id", filter.as_str()), ("select", "*")]);
        let rows: Vec<LedgerRow> = self.send(req)?.json()?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(StoredLedger {
                balance: row.balance,
                transactions: row.transactions,
            });
        }
        // Registered users get their ledger row on the first save.
        let req = self
            .client
            .get(self.table_url("accounts"))
            .query(&[("user_id", filter.as_str()), ("select", "user_id")]);
        let owners: Vec<serde_json::Value> = self.send(req)?.json()?;
        if owners.is_empty() {
            return Err(StoreError::NotFound(user_id.to_string()));
        }
        Ok(StoredLedger {
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        })
    }

    fn save(
        &self,
        user_id: &str,
        balance: Decimal,
        transactions: &[Transaction],
    ) -> Result<(), StoreError> {
        let row = LedgerRow {
            user_id: user_id.to_string(),
            balance,
            transactions: transactions.to_vec(),
            updated_at: Utc::now(),
        };
        let req = self
            .client
            .post(self.table_url("ledgers"))
            .query(&[("on_conflict", "user_id")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&[&row]);
        self.send(req)?;
        // Mirror the balance on the account row; the ledger row stays the
        // source of truth if this second write is lost.
        let filter = format!("eq.{}", user_id);
        let req = self
            .client
            .patch(self.table_url("accounts"))
            .query(&[("user_id", filter.as_str())])
            .json(&serde_json::json!({ "balance": balance }));
        if let Err(e) = self.send(req) {
            tracing::warn!(user_id, error = %e, "account balance mirror not updated");
        }
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "remote"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionKind;

    #[test]
    fn table_urls_ignore_trailing_slash() {
        let store = RemoteStore::new("https://example.supabase.co/", Some("k")).unwrap();
        assert_eq!(
            store.table_url("ledgers"),
            "https://example.supabase.co/rest/v1/ledgers"
        );
    }

    #[test]
    fn ledger_row_uses_persisted_field_names() {
        let t = Transaction::new(TransactionKind::Income, Decimal::new(5000, 2), "salary", None)
            .unwrap();
        let row = LedgerRow {
            user_id: "u1".into(),
            balance: Decimal::new(5000, 2),
            transactions: vec![t],
            updated_at: Utc::now(),
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v["balance"], "50.00");
        assert_eq!(v["transactions"][0]["type"], "income");
        assert_eq!(v["transactions"][0]["amount"], "50.00");
        assert_eq!(v["transactions"][0]["category"], "income");
        assert!(v["transactions"][0]["date"].is_string());
    }
}

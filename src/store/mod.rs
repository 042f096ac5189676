// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence adapters for accounts and ledgers.
//!
//! Exactly one backend is used per deployment; it is picked from the
//! configuration by [`open`] and then only reached through [`LedgerStore`].

pub mod memory;
pub mod remote;
pub mod sqlite;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::config::{Backend, Config};
use crate::models::{Account, NewAccount, Transaction};

pub use memory::MemoryStore;
pub use remote::RemoteStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user name already exists")]
    Conflict,

    #[error("no stored ledger for user {0}")]
    NotFound(String),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote store answered {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("corrupt stored data: {0}")]
    Corrupt(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// A ledger as persisted: the balance column next to the full log.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredLedger {
    pub balance: Decimal,
    pub transactions: Vec<Transaction>,
}

pub trait LedgerStore {
    /// Insert the account if no account with the same user name exists.
    /// Returns `StoreError::Conflict` otherwise.
    fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError>;

    fn find_account(&self, user_name: &str) -> Result<Option<Account>, StoreError>;

    fn accounts(&self) -> Result<Vec<Account>, StoreError>;

    fn load(&self, user_id: &str) -> Result<StoredLedger, StoreError>;

    /// Replace the stored log and balance in a single atomic write.
    fn save(
        &self,
        user_id: &str,
        balance: Decimal,
        transactions: &[Transaction],
    ) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

pub fn open(config: &Config) -> anyhow::Result<Box<dyn LedgerStore>> {
    let store: Box<dyn LedgerStore> = match &config.backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::Sqlite { path } => Box::new(SqliteStore::open(path)?),
        Backend::Remote { url, api_key } => Box::new(RemoteStore::new(url, api_key.as_deref())?),
    };
    tracing::debug!(backend = store.backend(), "persistence adapter ready");
    Ok(store)
}

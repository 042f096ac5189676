// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use super::{LedgerStore, StoreError, StoredLedger};
use crate::models::{Account, NewAccount, Transaction};

#[derive(Default)]
struct Inner {
    // user_name -> account
    accounts: HashMap<String, Account>,
    ledgers: HashMap<String, StoredLedger>,
}

/// Process-local store. Data lives as long as the value does.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LedgerStore for MemoryStore {
    fn create_account(&self, account: &NewAccount) -> Result<Account, StoreError> {
        let mut inner = self.lock()?;
        if inner.accounts.contains_key(&account.user_name) {
            return Err(StoreError::Conflict);
        }
        let created = account.clone().into_account();
        inner
            .accounts
            .insert(created.user_name.clone(), created.clone());
        inner.ledgers.insert(
            created.user_id.clone(),
            StoredLedger {
                balance: Decimal::ZERO,
                transactions: Vec::new(),
            },
        );
        Ok(created)
    }

    fn find_account(&self, user_name: &str) -> Result<Option<Account>, StoreError> {
        let inner = self.lock()?;
        let mut found = inner.accounts.get(user_name).cloned();
        if let Some(acct) = found.as_mut() {
            if let Some(l) = inner.ledgers.get(&acct.user_id) {
                acct.balance = l.balance;
            }
        }
        Ok(found)
    }

    fn accounts(&self) -> Result<Vec<Account>, StoreError> {
        let inner = self.lock()?;
        let mut out: Vec<Account> = inner
            .accounts
            .values()
            .map(|a| {
                let mut a = a.clone();
                if let Some(l) = inner.ledgers.get(&a.user_id) {
                    a.balance = l.balance;
                }
                a
            })
            .collect();
        out.sort_by(|a, b| a.user_name.cmp(&b.user_name));
        Ok(out)
    }

    fn load(&self, user_id: &str) -> Result<StoredLedger, StoreError> {
        self.lock()?
            .ledgers
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))
    }

    fn save(
        &self,
        user_id: &str,
        balance: Decimal,
        transactions: &[Transaction],
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let slot = inner
            .ledgers
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.to_string()))?;
        *slot = StoredLedger {
            balance,
            transactions: transactions.to_vec(),
        };
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

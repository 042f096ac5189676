// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{SubsecRound, Utc};
use ulid::Ulid;

use crate::auth::{check_password_policy, dummy_hash, hash_password, verify_password};
use crate::error::{LedgerError, Result};
use crate::models::{Account, NewAccount};
use crate::store::{LedgerStore, StoreError};

/// Registration and credential checks on top of a store.
///
/// Identity is a random id issued here; the user name is only the lookup key.
pub struct AccountDirectory<'s> {
    store: &'s dyn LedgerStore,
    hash_iterations: u32,
}

impl<'s> AccountDirectory<'s> {
    pub fn new(store: &'s dyn LedgerStore, hash_iterations: u32) -> Self {
        Self {
            store,
            hash_iterations,
        }
    }

    pub fn register(&self, username: &str, password: &str) -> Result<Account> {
        let user_name = normalize_user_name(username)?;
        check_password_policy(password)?;
        let new = NewAccount {
            user_id: Ulid::new().to_string(),
            user_name: user_name.clone(),
            password_hash: hash_password(password, self.hash_iterations),
            created_at: Utc::now().trunc_subsecs(0),
        };
        match self.store.create_account(&new) {
            Ok(account) => {
                tracing::info!(user = %account.user_name, backend = self.store.backend(), "account registered");
                Ok(account)
            }
            Err(StoreError::Conflict) => Err(LedgerError::Conflict(user_name)),
            Err(e) => Err(e.into()),
        }
    }

    /// Unknown names and wrong passwords fail the same way. `remaining` is
    /// filled in by the session, which owns the attempt counter.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Account> {
        let user_name = username.trim();
        let Some(account) = self.store.find_account(user_name)? else {
            let _ = verify_password(password, &dummy_hash(self.hash_iterations));
            return Err(LedgerError::Denied { remaining: 0 });
        };
        if !verify_password(password, &account.password_hash) {
            return Err(LedgerError::Denied { remaining: 0 });
        }
        Ok(account)
    }
}

fn normalize_user_name(username: &str) -> Result<String> {
    let name = username.trim();
    if name.is_empty() {
        return Err(LedgerError::invalid("user name must not be blank"));
    }
    Ok(name.to_string())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! One user's interactive session.
//!
//! The session binds a verified account to its ledger in memory and forwards
//! every mutation to the store. A failed save never rolls the ledger back:
//! memory stays the source of truth and the session is marked dirty until a
//! later mutation or `refresh` gets a save through.

use rust_decimal::Decimal;

use crate::config::{Config, DEFAULT_MAX_LOGIN_ATTEMPTS};
use crate::directory::AccountDirectory;
use crate::error::{LedgerError, Result};
use crate::ledger::Ledger;
use crate::models::{Account, Category, Transaction, TransactionKind};
use crate::store::LedgerStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub max_login_attempts: u32,
    pub hash_iterations: u32,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            max_login_attempts: DEFAULT_MAX_LOGIN_ATTEMPTS,
            hash_iterations: crate::auth::DEFAULT_ITERATIONS,
        }
    }
}

impl From<&Config> for SessionPolicy {
    fn from(cfg: &Config) -> Self {
        Self {
            max_login_attempts: cfg.max_login_attempts,
            hash_iterations: cfg.hash_iterations,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Saved,
    /// The store rejected the write; the reason is for display.
    Unsynced(String),
}

impl SyncStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SyncStatus::Saved)
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub transaction: Transaction,
    pub sync: SyncStatus,
}

struct Active {
    account: Account,
    ledger: Ledger,
    dirty: bool,
}

pub struct Session<'s> {
    store: &'s dyn LedgerStore,
    policy: SessionPolicy,
    failed_attempts: u32,
    active: Option<Active>,
}

impl<'s> Session<'s> {
    pub fn new(store: &'s dyn LedgerStore, policy: SessionPolicy) -> Self {
        Self {
            store,
            policy,
            failed_attempts: 0,
            active: None,
        }
    }

    fn directory(&self) -> AccountDirectory<'s> {
        AccountDirectory::new(self.store, self.policy.hash_iterations)
    }

    /// Create an account and log it in.
    pub fn register(&mut self, username: &str, password: &str, confirmation: &str) -> Result<&Account> {
        if password != confirmation {
            return Err(LedgerError::invalid("password confirmation does not match"));
        }
        self.flush_before_switch()?;
        let account = self.directory().register(username, password)?;
        let ledger = Ledger::new(account.user_id.clone());
        self.bind(account, ledger);
        self.account().ok_or(LedgerError::NotLoggedIn)
    }

    /// The failure counter is scoped to this session only; once it reaches
    /// the limit every attempt is refused until the session is ended.
    pub fn login(&mut self, username: &str, password: &str) -> Result<&Account> {
        let max = self.policy.max_login_attempts;
        if self.failed_attempts >= max {
            tracing::warn!(attempts = self.failed_attempts, "login refused: session locked out");
            return Err(LedgerError::LockedOut);
        }
        self.flush_before_switch()?;
        let account = match self.directory().authenticate(username, password) {
            Ok(account) => account,
            Err(LedgerError::Denied { .. }) => {
                self.failed_attempts += 1;
                tracing::info!(attempts = self.failed_attempts, "login denied");
                if self.failed_attempts >= max {
                    tracing::warn!(attempts = self.failed_attempts, "session locked out");
                    return Err(LedgerError::LockedOut);
                }
                return Err(LedgerError::Denied {
                    remaining: max - self.failed_attempts,
                });
            }
            Err(e) => return Err(e),
        };
        self.failed_attempts = 0;
        let ledger = self.load_ledger(&account.user_id)?;
        self.bind(account, ledger);
        self.account().ok_or(LedgerError::NotLoggedIn)
    }

    fn load_ledger(&self, user_id: &str) -> Result<Ledger> {
        let stored = self.store.load(user_id)?;
        let (ledger, drift) = Ledger::restore(user_id, stored.balance, stored.transactions)?;
        if let Some(d) = drift {
            tracing::warn!(
                user_id,
                stored = %d.stored,
                recomputed = %d.recomputed,
                "stored balance disagrees with transaction log; using recomputed balance"
            );
        }
        Ok(ledger)
    }

    /// Give unsynced changes one more save before another account is bound.
    /// If the store still refuses, the current user stays logged in.
    fn flush_before_switch(&mut self) -> Result<()> {
        let store = self.store;
        let Some(active) = self.active.as_mut().filter(|a| a.dirty) else {
            return Ok(());
        };
        match persist(store, active) {
            SyncStatus::Saved => Ok(()),
            SyncStatus::Unsynced(reason) => Err(LedgerError::UnsavedChanges(reason)),
        }
    }

    fn bind(&mut self, account: Account, ledger: Ledger) {
        tracing::info!(user = %account.user_name, backend = self.store.backend(), "session started");
        self.active = Some(Active {
            account,
            ledger,
            dirty: false,
        });
    }

    pub fn add_transaction(
        &mut self,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        category: Option<Category>,
    ) -> Result<Recorded> {
        let store = self.store;
        let active = self.active.as_mut().ok_or(LedgerError::NotLoggedIn)?;
        let transaction = active
            .ledger
            .add(kind, amount, description, category)?
            .clone();
        let sync = persist(store, active);
        Ok(Recorded { transaction, sync })
    }

    pub fn clear_all(&mut self) -> Result<SyncStatus> {
        let store = self.store;
        let active = self.active.as_mut().ok_or(LedgerError::NotLoggedIn)?;
        active.ledger.clear();
        Ok(persist(store, active))
    }

    /// Push unsynced changes if there are any, otherwise reload from the
    /// store.
    pub fn refresh(&mut self) -> Result<SyncStatus> {
        let store = self.store;
        let active = self.active.as_mut().ok_or(LedgerError::NotLoggedIn)?;
        if active.dirty {
            return Ok(persist(store, active));
        }
        let user_id = active.account.user_id.clone();
        match self.load_ledger(&user_id) {
            Ok(ledger) => {
                if let Some(active) = self.active.as_mut() {
                    active.account.balance = ledger.balance();
                    active.ledger = ledger;
                }
                Ok(SyncStatus::Saved)
            }
            Err(LedgerError::Persistence(e)) => {
                tracing::warn!(error = %e, "refresh failed; keeping in-memory ledger");
                Ok(SyncStatus::Unsynced(e.to_string()))
            }
            Err(e) => Err(e),
        }
    }

    pub fn logout(&mut self) {
        if let Some(active) = self.active.take() {
            if active.dirty {
                tracing::warn!(user = %active.account.user_name, "logging out with unsynced changes");
            }
            tracing::info!(user = %active.account.user_name, "logged out");
        }
    }

    /// Drop everything the session holds, including the attempt counter.
    pub fn end_session(&mut self) {
        self.logout();
        self.failed_attempts = 0;
    }

    pub fn account(&self) -> Option<&Account> {
        self.active.as_ref().map(|a| &a.account)
    }

    pub fn ledger(&self) -> Option<&Ledger> {
        self.active.as_ref().map(|a| &a.ledger)
    }

    pub fn is_dirty(&self) -> bool {
        self.active.as_ref().is_some_and(|a| a.dirty)
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn remaining_attempts(&self) -> u32 {
        self.policy
            .max_login_attempts
            .saturating_sub(self.failed_attempts)
    }
}

fn persist(store: &dyn LedgerStore, active: &mut Active) -> SyncStatus {
    let ledger = &active.ledger;
    match store.save(ledger.owner_id(), ledger.balance(), ledger.transactions()) {
        Ok(()) => {
            active.dirty = false;
            active.account.balance = ledger.balance();
            tracing::info!(
                user = %active.account.user_name,
                balance = %ledger.balance(),
                rows = ledger.len(),
                "ledger saved"
            );
            SyncStatus::Saved
        }
        Err(e) => {
            active.dirty = true;
            tracing::warn!(user = %active.account.user_name, error = %e, "ledger not saved; changes kept in memory");
            SyncStatus::Unsynced(e.to_string())
        }
    }
}

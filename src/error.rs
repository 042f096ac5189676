// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Failures surfaced by the ledger, the account directory and the session.
///
/// Every variant except `Persistence` is recovered at the boundary where it
/// occurs and shown to the user as a message; none of them mutate state.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("user name '{0}' is already taken")]
    Conflict(String),

    #[error("wrong user name or password ({remaining} attempts left)")]
    Denied { remaining: u32 },

    #[error("too many failed login attempts; start a new session to try again")]
    LockedOut,

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("unsaved changes could not be stored ({0}); run refresh or logout first")]
    UnsavedChanges(String),

    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),
}

impl LedgerError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        LedgerError::InvalidInput(msg.into())
    }
}

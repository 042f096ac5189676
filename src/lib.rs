// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod export;
pub mod ledger;
pub mod logging;
pub mod models;
pub mod session;
pub mod store;
pub mod utils;

pub use error::{LedgerError, Result};
pub use ledger::Ledger;
pub use models::{Account, Category, Totals, Transaction, TransactionKind};
pub use session::{Session, SessionPolicy, SyncStatus};
pub use store::{LedgerStore, MemoryStore, RemoteStore, SqliteStore, StoreError};

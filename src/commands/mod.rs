// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod accounts;
pub mod doctor;
pub mod exporter;
pub mod reports;
pub mod shell;
pub mod transactions;

use anyhow::{Context, Result};

use crate::session::{Session, SessionPolicy, SyncStatus};
use crate::store::LedgerStore;

pub(crate) fn arg<'a>(m: &'a clap::ArgMatches, name: &str) -> Result<&'a str> {
    m.get_one::<String>(name)
        .map(String::as_str)
        .with_context(|| format!("--{} is required", name))
}

/// Log in with `--user`/`--password` for a one-shot command.
pub fn login<'s>(
    store: &'s dyn LedgerStore,
    policy: SessionPolicy,
    m: &clap::ArgMatches,
) -> Result<Session<'s>> {
    let mut session = Session::new(store, policy);
    session.login(arg(m, "user")?, arg(m, "password")?)?;
    Ok(session)
}

pub(crate) fn report_sync(sync: &SyncStatus) {
    if let SyncStatus::Unsynced(reason) = sync {
        eprintln!("warning: change kept in memory but not saved: {}", reason);
    }
}

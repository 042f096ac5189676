// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;

use super::arg;
use crate::session::{Session, SessionPolicy};
use crate::store::LedgerStore;

pub fn register(store: &dyn LedgerStore, policy: SessionPolicy, sub: &clap::ArgMatches) -> Result<()> {
    let user = arg(sub, "user")?;
    let password = arg(sub, "password")?;
    let confirm = sub
        .get_one::<String>("confirm")
        .map(String::as_str)
        .unwrap_or(password);
    let mut session = Session::new(store, policy);
    let account = session.register(user, password, confirm)?;
    println!("Registered '{}'", account.user_name);
    Ok(())
}

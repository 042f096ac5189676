// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Context, Result};

use super::{arg, login};
use crate::export;
use crate::session::SessionPolicy;
use crate::store::LedgerStore;

pub fn handle(store: &dyn LedgerStore, policy: SessionPolicy, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(store, policy, sub),
        _ => Ok(()),
    }
}

fn export_transactions(
    store: &dyn LedgerStore,
    policy: SessionPolicy,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let fmt = arg(sub, "format")?.trim().to_lowercase();
    let out = arg(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let session = login(store, policy, sub)?;
    let Some(ledger) = session.ledger() else {
        return Ok(());
    };
    let file = std::fs::File::create(out).with_context(|| format!("Create {}", out))?;
    export::write_as(&fmt, ledger, std::io::BufWriter::new(file))?;
    println!("Exported {} transactions to {}", ledger.len(), out);
    Ok(())
}

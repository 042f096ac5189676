// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::ledger::Ledger;
use crate::models::fmt_timestamp;

pub const COLUMNS: [&str; 7] = [
    "id",
    "user_id",
    "type",
    "amount",
    "description",
    "category",
    "date",
];

#[derive(Debug, Serialize)]
pub struct ExportRow<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub amount: String,
    pub description: &'a str,
    pub category: &'static str,
    pub date: String,
}

pub fn rows(ledger: &Ledger) -> Vec<ExportRow<'_>> {
    ledger
        .transactions()
        .iter()
        .map(|t| ExportRow {
            id: t.id(),
            user_id: ledger.owner_id(),
            kind: t.kind().as_str(),
            amount: t.amount().to_string(),
            description: t.description(),
            category: t.category().key(),
            date: fmt_timestamp(&t.timestamp()),
        })
        .collect()
}

pub fn write_csv<W: Write>(ledger: &Ledger, out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(COLUMNS)?;
    for r in rows(ledger) {
        wtr.write_record([
            r.id,
            r.user_id,
            r.kind,
            r.amount.as_str(),
            r.description,
            r.category,
            r.date.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(ledger: &Ledger, mut out: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, &rows(ledger))?;
    out.flush()?;
    Ok(())
}

/// Dispatch on a user-supplied format name (`csv` or `json`).
pub fn write_as<W: Write>(format: &str, ledger: &Ledger, out: W) -> Result<()> {
    match format.trim().to_lowercase().as_str() {
        "csv" => write_csv(ledger, out),
        "json" => write_json(ledger, out),
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{bail, Result};
use serde::Serialize;

use super::{arg, login, report_sync};
use crate::ledger::Ledger;
use crate::models::{fmt_timestamp, Category, TransactionKind};
use crate::session::SessionPolicy;
use crate::store::LedgerStore;
use crate::utils::{fmt_amount, fmt_money, maybe_print_json, parse_decimal, pretty_table};

pub fn handle(store: &dyn LedgerStore, policy: SessionPolicy, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, policy, sub)?,
        Some(("list", sub)) => list(store, policy, sub)?,
        Some(("clear", sub)) => clear(store, policy, sub)?,
        _ => {}
    }
    Ok(())
}

fn add(store: &dyn LedgerStore, policy: SessionPolicy, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionKind = arg(sub, "type")?.parse()?;
    let amount = parse_decimal(arg(sub, "amount")?)?;
    let desc = arg(sub, "desc")?;
    let category = sub
        .get_one::<String>("category")
        .map(|c| c.parse::<Category>())
        .transpose()?;

    let mut session = login(store, policy, sub)?;
    let recorded = session.add_transaction(kind, amount, desc, category)?;
    report_sync(&recorded.sync);
    let t = &recorded.transaction;
    println!(
        "Recorded {} '{}' {} ({})",
        t.kind(),
        t.description(),
        fmt_money(&t.amount()),
        t.category().label_ar()
    );
    if let Some(ledger) = session.ledger() {
        println!("Balance: {}", fmt_money(&ledger.balance()));
    }
    Ok(())
}

fn list(store: &dyn LedgerStore, policy: SessionPolicy, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = login(store, policy, sub)?;
    let Some(ledger) = session.ledger() else {
        return Ok(());
    };
    let data = query_rows(ledger, sub.get_one::<usize>("limit").copied());
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|r| {
                vec![
                    r.date.clone(),
                    r.r#type.clone(),
                    r.description.clone(),
                    r.category.clone(),
                    r.amount.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Type", "Description", "Category", "Amount"], rows)
        );
    }
    Ok(())
}

fn clear(store: &dyn LedgerStore, policy: SessionPolicy, sub: &clap::ArgMatches) -> Result<()> {
    if !sub.get_flag("yes") {
        bail!("Refusing to delete all transactions without --yes");
    }
    let mut session = login(store, policy, sub)?;
    let sync = session.clear_all()?;
    report_sync(&sync);
    println!("Cleared all transactions; balance is now {}", fmt_money(&rust_decimal::Decimal::ZERO));
    Ok(())
}

#[derive(Serialize)]
pub struct TransactionRow {
    pub date: String,
    pub r#type: String,
    pub description: String,
    pub category: String,
    pub amount: String,
}

/// Newest first, optionally capped at `limit`.
pub fn query_rows(ledger: &Ledger, limit: Option<usize>) -> Vec<TransactionRow> {
    ledger
        .recent(limit.unwrap_or(usize::MAX))
        .map(|t| TransactionRow {
            date: fmt_timestamp(&t.timestamp()),
            r#type: t.kind().as_str().to_string(),
            description: t.description().to_string(),
            category: t.category().key().to_string(),
            amount: fmt_amount(&t.amount()),
        })
        .collect()
}

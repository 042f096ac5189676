// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Serialize;

use super::login;
use crate::ledger::Ledger;
use crate::session::SessionPolicy;
use crate::store::LedgerStore;
use crate::utils::{fmt_amount, fmt_money, maybe_print_json, pretty_table};

pub fn handle(store: &dyn LedgerStore, policy: SessionPolicy, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, policy, sub)?,
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct CategorySpend {
    pub category: String,
    pub label: String,
    pub spent: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub user_id: String,
    pub balance: Decimal,
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net: Decimal,
    pub transactions: usize,
    pub by_category: Vec<CategorySpend>,
}

/// Largest spending category first.
pub fn build_summary(ledger: &Ledger) -> Summary {
    let totals = ledger.totals();
    let mut by_category: Vec<CategorySpend> = ledger
        .breakdown_by_category()
        .into_iter()
        .map(|(c, spent)| CategorySpend {
            category: c.key().to_string(),
            label: c.label_ar().to_string(),
            spent,
        })
        .collect();
    by_category.sort_by(|a, b| b.spent.cmp(&a.spent));
    Summary {
        user_id: ledger.owner_id().to_string(),
        balance: ledger.balance(),
        income_total: totals.income_total,
        expense_total: totals.expense_total,
        net: totals.net,
        transactions: ledger.len(),
        by_category,
    }
}

fn summary(store: &dyn LedgerStore, policy: SessionPolicy, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let session = login(store, policy, sub)?;
    let Some(ledger) = session.ledger() else {
        return Ok(());
    };
    let s = build_summary(ledger);
    if maybe_print_json(json_flag, jsonl_flag, &s)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Balance", "Income", "Expenses", "Net", "Transactions"],
            vec![vec![
                fmt_money(&s.balance),
                fmt_money(&s.income_total),
                fmt_money(&s.expense_total),
                fmt_money(&s.net),
                s.transactions.to_string(),
            ]],
        )
    );
    if !s.by_category.is_empty() {
        let rows = s
            .by_category
            .iter()
            .map(|c| vec![c.label.clone(), c.category.clone(), fmt_amount(&c.spent)])
            .collect();
        println!("{}", pretty_table(&["الفئة", "Category", "Spent"], rows));
    }
    Ok(())
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Line-oriented session: one command per line, errors are printed and the
//! loop keeps going. The login attempt counter lives as long as the loop.

use std::io::{BufRead, Write};

use anyhow::Result;

use crate::error::LedgerError;
use crate::models::{Category, TransactionKind};
use crate::session::{Session, SyncStatus};
use crate::utils::{fmt_money, parse_decimal};

const HELP: &str = "\
commands:
  register <user> <password> <confirm>
  login <user> <password>
  add income <amount> <description...>
  add expense <category> <amount> <description...>
  list [n]
  summary
  clear
  refresh
  logout
  quit";

pub fn run<R: BufRead, W: Write>(session: &mut Session<'_>, input: R, mut out: W) -> Result<()> {
    writeln!(out, "{}", HELP)?;
    for line in input.lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        let Some((&cmd, rest)) = words.split_first() else {
            continue;
        };
        if matches!(cmd, "quit" | "exit") {
            break;
        }
        if let Err(e) = dispatch(session, cmd, rest, &mut out) {
            writeln!(out, "error: {}", e)?;
        }
    }
    session.end_session();
    Ok(())
}

fn dispatch<W: Write>(session: &mut Session<'_>, cmd: &str, args: &[&str], out: &mut W) -> Result<()> {
    match (cmd, args) {
        ("register", [user, password, confirm]) => {
            let account = session.register(user, password, confirm)?;
            writeln!(out, "registered and logged in as {}", account.user_name)?;
        }
        ("login", [user, password]) => match session.login(user, password) {
            Ok(account) => writeln!(out, "welcome {}", account.user_name)?,
            Err(LedgerError::Denied { remaining }) => {
                writeln!(out, "wrong user name or password, {} attempts left", remaining)?
            }
            Err(e) => return Err(e.into()),
        },
        ("add", ["income", amount, desc @ ..]) if !desc.is_empty() => {
            let amount = parse_decimal(amount)?;
            let r = session.add_transaction(TransactionKind::Income, amount, &desc.join(" "), None)?;
            print_sync(out, &r.sync)?;
            writeln!(out, "added income {}", fmt_money(&r.transaction.amount()))?;
        }
        ("add", ["expense", category, amount, desc @ ..]) if !desc.is_empty() => {
            let category: Category = category.parse()?;
            let amount = parse_decimal(amount)?;
            let r = session.add_transaction(
                TransactionKind::Expense,
                amount,
                &desc.join(" "),
                Some(category),
            )?;
            print_sync(out, &r.sync)?;
            writeln!(
                out,
                "added expense {} ({})",
                fmt_money(&r.transaction.amount()),
                category.label_ar()
            )?;
        }
        ("list", rest) => {
            let n = match rest.first() {
                Some(n) => n.parse()?,
                None => 5,
            };
            let ledger = session.ledger().ok_or(LedgerError::NotLoggedIn)?;
            for t in ledger.recent(n) {
                writeln!(
                    out,
                    "{}  {:<7}  {:<13}  {}  {}",
                    crate::models::fmt_timestamp(&t.timestamp()),
                    t.kind(),
                    t.category().key(),
                    fmt_money(&t.amount()),
                    t.description()
                )?;
            }
        }
        ("summary", []) => {
            let ledger = session.ledger().ok_or(LedgerError::NotLoggedIn)?;
            let totals = ledger.totals();
            writeln!(out, "balance: {}", fmt_money(&ledger.balance()))?;
            writeln!(out, "income: {}", fmt_money(&totals.income_total))?;
            writeln!(out, "expenses: {}", fmt_money(&totals.expense_total))?;
            writeln!(out, "net: {}", fmt_money(&totals.net))?;
            for (c, spent) in ledger.breakdown_by_category() {
                writeln!(out, "  {}: {}", c.label_ar(), fmt_money(&spent))?;
            }
        }
        ("clear", []) => {
            let sync = session.clear_all()?;
            print_sync(out, &sync)?;
            writeln!(out, "all transactions cleared")?;
        }
        ("refresh", []) => {
            let sync = session.refresh()?;
            print_sync(out, &sync)?;
            if sync.is_saved() {
                writeln!(out, "up to date")?;
            }
        }
        ("logout", []) => {
            let dirty = session.is_dirty();
            session.logout();
            if dirty {
                writeln!(out, "warning: unsaved changes were discarded")?;
            }
            writeln!(out, "logged out")?;
        }
        ("help", _) => writeln!(out, "{}", HELP)?,
        _ => writeln!(out, "unrecognized command; type 'help'")?,
    }
    Ok(())
}

fn print_sync<W: Write>(out: &mut W, sync: &SyncStatus) -> Result<()> {
    if let SyncStatus::Unsynced(reason) = sync {
        writeln!(out, "warning: not saved ({}); will retry on next change or refresh", reason)?;
    }
    Ok(())
}

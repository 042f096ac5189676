// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use serde::Serialize;

use crate::error::LedgerError;
use crate::ledger::Ledger;
use crate::store::LedgerStore;
use crate::utils::{fmt_amount, pretty_table};

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Issue {
    pub user: String,
    pub kind: &'static str,
    pub detail: String,
}

/// Accounts whose stored balance disagrees with their stored log, or whose
/// ledger cannot be read at all.
pub fn find_issues(store: &dyn LedgerStore) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();
    for account in store.accounts()? {
        let restored = store
            .load(&account.user_id)
            .map_err(LedgerError::from)
            .and_then(|stored| {
                Ledger::restore(&account.user_id, stored.balance, stored.transactions)
            });
        match restored {
            Ok((_, drift)) => {
                if let Some(d) = drift {
                    issues.push(Issue {
                        user: account.user_name.clone(),
                        kind: "balance_drift",
                        detail: format!(
                            "stored {} vs log {}",
                            fmt_amount(&d.stored),
                            fmt_amount(&d.recomputed)
                        ),
                    });
                }
            }
            Err(e) => issues.push(Issue {
                user: account.user_name.clone(),
                kind: "unreadable_ledger",
                detail: e.to_string(),
            }),
        }
    }
    Ok(issues)
}

pub fn handle(store: &dyn LedgerStore) -> Result<()> {
    let issues = find_issues(store)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.user, i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["User", "Issue", "Detail"], rows));
    }
    Ok(())
}

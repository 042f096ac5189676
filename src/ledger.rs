// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Append-only transaction log with a derived balance.
//!
//! The balance is never adjusted incrementally: every mutation and every
//! restore recomputes it from the full log, so it always equals
//! `Σ income − Σ expense`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{LedgerError, Result};
use crate::models::{Category, Totals, Transaction, TransactionKind};
use crate::store::StoreError;

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    owner_id: String,
    transactions: Vec<Transaction>,
    totals: Totals,
}

/// A stored balance that disagreed with the sum of the stored log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Drift {
    pub stored: Decimal,
    pub recomputed: Decimal,
}

const EMPTY: Totals = Totals {
    income_total: Decimal::ZERO,
    expense_total: Decimal::ZERO,
    net: Decimal::ZERO,
};

impl Ledger {
    pub fn new(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            transactions: Vec::new(),
            totals: EMPTY,
        }
    }

    /// Rebuild a ledger from persisted parts. The balance is recomputed from
    /// the log; a disagreeing stored balance is reported, never trusted.
    /// A log whose sums do not fit in a `Decimal` is treated as corrupt.
    pub fn restore(
        owner_id: impl Into<String>,
        stored_balance: Decimal,
        transactions: Vec<Transaction>,
    ) -> Result<(Self, Option<Drift>)> {
        let totals = tally(&transactions).ok_or_else(|| {
            StoreError::Corrupt("transaction log totals exceed the decimal range".into())
        })?;
        let ledger = Self {
            owner_id: owner_id.into(),
            transactions,
            totals,
        };
        let drift = (ledger.balance() != stored_balance).then_some(Drift {
            stored: stored_balance,
            recomputed: ledger.balance(),
        });
        Ok((ledger, drift))
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn balance(&self) -> Decimal {
        self.totals.net
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Record a new transaction. Nothing changes when validation fails or
    /// when the new totals would overflow.
    pub fn add(
        &mut self,
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        category: Option<Category>,
    ) -> Result<&Transaction> {
        let tx = Transaction::new(kind, amount, description, category)?;
        let totals = tally(self.transactions.iter().chain(std::iter::once(&tx)))
            .ok_or_else(|| LedgerError::invalid("amount too large"))?;
        self.transactions.push(tx);
        self.totals = totals;
        Ok(&self.transactions[self.transactions.len() - 1])
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
        self.totals = EMPTY;
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    /// Expense totals per category; income is left out.
    pub fn breakdown_by_category(&self) -> BTreeMap<Category, Decimal> {
        let mut out = BTreeMap::new();
        for t in &self.transactions {
            if t.kind() == TransactionKind::Expense {
                let slot = out.entry(t.category()).or_insert(Decimal::ZERO);
                // Bounded by the expense total, which is known to fit.
                *slot = slot.saturating_add(t.amount());
            }
        }
        out
    }

    /// The newest `n` transactions, newest first.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter().rev().take(n)
    }
}

/// Sum the log from scratch. `None` if any running sum overflows.
fn tally<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Option<Totals> {
    let mut income_total = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;
    for t in transactions {
        match t.kind() {
            TransactionKind::Income => income_total = income_total.checked_add(t.amount())?,
            TransactionKind::Expense => expense_total = expense_total.checked_add(t.amount())?,
        }
    }
    Some(Totals {
        income_total,
        expense_total,
        net: income_total.checked_sub(expense_total)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn assert_consistent(l: &Ledger) {
        let t = l.totals();
        assert_eq!(l.balance(), t.income_total - t.expense_total);
        assert_eq!(t.net, l.balance());
        let by_cat: Decimal = l.breakdown_by_category().values().copied().sum();
        assert_eq!(by_cat, t.expense_total);
    }

    #[test]
    fn salary_groceries_fuel_then_clear() {
        let mut l = Ledger::new("u1");
        l.add(TransactionKind::Income, dec("500000"), "salary", None)
            .unwrap();
        assert_eq!(l.balance(), dec("500000.00"));

        l.add(
            TransactionKind::Expense,
            dec("150000"),
            "groceries",
            Some(Category::Food),
        )
        .unwrap();
        assert_eq!(l.balance(), dec("350000.00"));
        let breakdown = l.breakdown_by_category();
        assert_eq!(breakdown.len(), 1);
        assert_eq!(breakdown[&Category::Food], dec("150000.00"));

        l.add(
            TransactionKind::Expense,
            dec("80000"),
            "fuel",
            Some(Category::Transport),
        )
        .unwrap();
        assert_eq!(l.balance(), dec("270000.00"));
        assert_eq!(
            l.totals(),
            Totals {
                income_total: dec("500000.00"),
                expense_total: dec("230000.00"),
                net: dec("270000.00"),
            }
        );
        assert_consistent(&l);

        l.clear();
        assert_eq!(l.balance(), Decimal::ZERO);
        assert!(l.transactions().is_empty());
        assert_consistent(&l);
    }

    #[test]
    fn rejected_add_leaves_ledger_untouched() {
        let mut l = Ledger::new("u1");
        l.add(TransactionKind::Income, dec("20"), "gift", None).unwrap();
        let before = l.clone();

        let err = l
            .add(TransactionKind::Income, Decimal::ZERO, "bad", None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(_)));
        assert!(l
            .add(TransactionKind::Expense, dec("-3"), "refund?", None)
            .is_err());
        assert!(l
            .add(TransactionKind::Expense, dec("3"), "   ", Some(Category::Bills))
            .is_err());
        assert_eq!(l, before);
    }

    #[test]
    fn invariant_holds_across_mixed_sequence() {
        let mut l = Ledger::new("u1");
        let steps = [
            (TransactionKind::Income, "1000.25", None),
            (TransactionKind::Expense, "10.10", Some(Category::Health)),
            (TransactionKind::Expense, "999.99", Some(Category::Shopping)),
            (TransactionKind::Income, "0.01", None),
            (TransactionKind::Expense, "5", None),
            (TransactionKind::Expense, "7.5", Some(Category::Health)),
        ];
        for (kind, amt, cat) in steps {
            l.add(kind, dec(amt), "step", cat).unwrap();
            assert_consistent(&l);
        }
        assert_eq!(l.balance(), dec("-22.33"));
        assert_eq!(l.breakdown_by_category()[&Category::Health], dec("17.60"));
        assert_eq!(l.breakdown_by_category()[&Category::Other], dec("5"));
    }

    #[test]
    fn restore_recomputes_and_reports_drift() {
        let mut src = Ledger::new("u1");
        src.add(TransactionKind::Income, dec("100"), "a", None).unwrap();
        src.add(TransactionKind::Expense, dec("40"), "b", None).unwrap();

        let (ok, drift) = Ledger::restore("u1", dec("60"), src.transactions().to_vec()).unwrap();
        assert!(drift.is_none());
        assert_eq!(ok, src);

        let (healed, drift) =
            Ledger::restore("u1", dec("100"), src.transactions().to_vec()).unwrap();
        assert_eq!(healed.balance(), dec("60"));
        assert_eq!(
            drift,
            Some(Drift {
                stored: dec("100"),
                recomputed: dec("60"),
            })
        );
    }

    #[test]
    fn overflowing_amount_is_rejected_and_changes_nothing() {
        let mut l = Ledger::new("u1");
        l.add(TransactionKind::Income, Decimal::MAX, "jackpot", None)
            .unwrap();
        let before = l.clone();

        let err = l
            .add(TransactionKind::Income, Decimal::ONE, "one more", None)
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidInput(ref m) if m == "amount too large"));
        assert_eq!(l, before);
        assert_eq!(l.balance(), Decimal::MAX);

        // Expenses have their own running total, so this one fits.
        l.add(TransactionKind::Expense, Decimal::MAX, "spent it", None)
            .unwrap();
        assert_eq!(l.balance(), Decimal::ZERO);
        assert_consistent(&l);
    }

    #[test]
    fn restore_rejects_log_that_overflows() {
        let mut a = Ledger::new("u1");
        a.add(TransactionKind::Income, Decimal::MAX, "a", None).unwrap();
        let mut b = Ledger::new("u1");
        b.add(TransactionKind::Income, Decimal::MAX, "b", None).unwrap();
        let mut log = a.transactions().to_vec();
        log.extend_from_slice(b.transactions());

        let err = Ledger::restore("u1", Decimal::ZERO, log).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::Persistence(StoreError::Corrupt(_))
        ));
    }

    #[test]
    fn recent_is_newest_first() {
        let mut l = Ledger::new("u1");
        for i in 1..=7 {
            l.add(TransactionKind::Income, Decimal::from(i), &format!("t{i}"), None)
                .unwrap();
        }
        let names: Vec<&str> = l.recent(5).map(|t| t.description()).collect();
        assert_eq!(names, ["t7", "t6", "t5", "t4", "t3"]);
    }
}

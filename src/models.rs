// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{LedgerError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(LedgerError::invalid(format!(
                "unknown transaction type '{}' (use income|expense)",
                other
            ))),
        }
    }
}

/// Reporting tag. Expenses use one of the fixed spending categories, income
/// always carries the `Income` sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Bills,
    Shopping,
    Entertainment,
    Health,
    Other,
    Income,
}

impl Category {
    pub const EXPENSE: [Category; 7] = [
        Category::Food,
        Category::Transport,
        Category::Bills,
        Category::Shopping,
        Category::Entertainment,
        Category::Health,
        Category::Other,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Category::Food => "food",
            Category::Transport => "transport",
            Category::Bills => "bills",
            Category::Shopping => "shopping",
            Category::Entertainment => "entertainment",
            Category::Health => "health",
            Category::Other => "other",
            Category::Income => "income",
        }
    }

    /// Label shown to users of the Arabic interface.
    pub fn label_ar(&self) -> &'static str {
        match self {
            Category::Food => "الطعام",
            Category::Transport => "المواصلات",
            Category::Bills => "الفواتير",
            Category::Shopping => "التسوق",
            Category::Entertainment => "الترفيه",
            Category::Health => "الصحة",
            Category::Other => "أخرى",
            Category::Income => "دخل",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let lower = s.to_lowercase();
        Category::EXPENSE
            .iter()
            .chain(std::iter::once(&Category::Income))
            .find(|c| c.key() == lower || c.label_ar() == s)
            .copied()
            .ok_or_else(|| LedgerError::invalid(format!("unknown category '{}'", s)))
    }
}

/// One income or expense event. Immutable once built; corrections are new
/// transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    id: String,
    #[serde(rename = "type")]
    kind: TransactionKind,
    amount: Decimal,
    description: String,
    category: Category,
    #[serde(rename = "date")]
    timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Validate the inputs and stamp a new record with a fresh id and the
    /// current time (whole seconds).
    pub fn new(
        kind: TransactionKind,
        amount: Decimal,
        description: &str,
        category: Option<Category>,
    ) -> Result<Self> {
        let (description, category) = validate(kind, amount, description, category)?;
        Ok(Self {
            id: Ulid::new().to_string(),
            kind,
            amount,
            description,
            category,
            timestamp: Utc::now().trunc_subsecs(0),
        })
    }

    /// Rebuild a record read back from a store. No validation is applied:
    /// the persisted log is taken as it is.
    pub fn from_stored(
        id: String,
        kind: TransactionKind,
        amount: Decimal,
        description: String,
        category: Category,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind,
            amount,
            description,
            category,
            timestamp,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Contribution of this record to the balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

fn validate(
    kind: TransactionKind,
    amount: Decimal,
    description: &str,
    category: Option<Category>,
) -> Result<(String, Category)> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid(format!(
            "amount must be greater than zero (got {})",
            amount
        )));
    }
    let description = description.trim();
    if description.is_empty() {
        return Err(LedgerError::invalid("description must not be blank"));
    }
    let category = match (kind, category) {
        (TransactionKind::Income, None | Some(Category::Income)) => Category::Income,
        (TransactionKind::Income, Some(c)) => {
            return Err(LedgerError::invalid(format!(
                "income cannot be filed under '{}'",
                c
            )));
        }
        (TransactionKind::Expense, Some(Category::Income)) => {
            return Err(LedgerError::invalid(
                "expenses need a spending category, not 'income'",
            ));
        }
        (TransactionKind::Expense, Some(c)) => c,
        (TransactionKind::Expense, None) => Category::Other,
    };
    Ok((description.to_string(), category))
}

pub fn fmt_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: String,
    pub user_name: String,
    pub password_hash: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to create an account row; `balance` starts at zero.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user_id: String,
    pub user_name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl NewAccount {
    pub fn into_account(self) -> Account {
        Account {
            user_id: self.user_id,
            user_name: self.user_name,
            password_hash: self.password_hash,
            balance: Decimal::ZERO,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income_total: Decimal,
    pub expense_total: Decimal,
    pub net: Decimal,
}

//! Budget entries: the records users add, edit and delete.
//!
//! An entry is a single income, expense or savings movement. The JSON shape
//! (camelCase, type under `type`) is the one exchanged with the sync API and
//! the legacy entry file, so it must stay stable.

pub mod ledger;
pub mod summary;
pub mod validate;

use std::fmt;
use std::str::FromStr;

use chrono::{SecondsFormat, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::error::BudgetError;

/// Kind of budget entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetEntryType {
    Income,
    Expense,
    SavingsDeposit,
    SavingsWithdrawal,
}

impl BudgetEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetEntryType::Income => "income",
            BudgetEntryType::Expense => "expense",
            BudgetEntryType::SavingsDeposit => "savings_deposit",
            BudgetEntryType::SavingsWithdrawal => "savings_withdrawal",
        }
    }

    /// The history category this type is listed under.
    pub fn category(&self) -> EntryCategory {
        match self {
            BudgetEntryType::Income => EntryCategory::Income,
            BudgetEntryType::Expense => EntryCategory::Expense,
            BudgetEntryType::SavingsDeposit | BudgetEntryType::SavingsWithdrawal => {
                EntryCategory::Savings
            }
        }
    }
}

impl fmt::Display for BudgetEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for BudgetEntryType {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "income" => Ok(BudgetEntryType::Income),
            "expense" => Ok(BudgetEntryType::Expense),
            "savings_deposit" => Ok(BudgetEntryType::SavingsDeposit),
            "savings_withdrawal" => Ok(BudgetEntryType::SavingsWithdrawal),
            other => Err(BudgetError::Validation(format!(
                "Unknown entry type '{}' (expected income, expense, savings_deposit or savings_withdrawal)",
                other
            ))),
        }
    }
}

impl ToSql for BudgetEntryType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BudgetEntryType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: BudgetError| FromSqlError::Other(Box::new(e)))
    }
}

/// History grouping: savings deposits and withdrawals share one list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryCategory {
    Income,
    Expense,
    Savings,
}

impl EntryCategory {
    pub fn label(&self) -> &'static str {
        match self {
            EntryCategory::Income => "Income",
            EntryCategory::Expense => "Expenses",
            EntryCategory::Savings => "Savings",
        }
    }
}

impl FromStr for EntryCategory {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(EntryCategory::Income),
            "expense" | "expenses" => Ok(EntryCategory::Expense),
            "savings" => Ok(EntryCategory::Savings),
            other => Err(BudgetError::Validation(format!(
                "Unknown category '{}' (expected income, expense or savings)",
                other
            ))),
        }
    }
}

/// A single income/expense/savings record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetEntry {
    pub id: String,
    pub amount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub entry_type: BudgetEntryType,
    pub created_at: String,
}

impl BudgetEntry {
    /// Build a new entry with a fresh id and the current timestamp.
    pub fn new(entry_type: BudgetEntryType, amount: f64, description: &str) -> Self {
        Self {
            id: generate_id(),
            amount,
            description: description.to_string(),
            entry_type,
            created_at: now_iso(),
        }
    }
}

/// Unique, time-ordered entry id.
pub fn generate_id() -> String {
    ulid::Ulid::new().to_string()
}

/// Current UTC time as RFC 3339 with millisecond precision, e.g. `2026-10-19T08:30:00.000Z`.
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

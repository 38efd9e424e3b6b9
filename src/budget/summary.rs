//! Aggregate totals and donut-chart segments.
//!
//! Donuts are reported as numbers only; how they are drawn is up to the
//! caller.

use serde::Serialize;

use super::{BudgetEntry, BudgetEntryType};

/// A donut ring: `value` shown against `total`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DonutSegment {
    pub value: f64,
    pub total: f64,
    /// Filled share of the ring, clamped to `0..=100`.
    pub percent: f64,
}

impl DonutSegment {
    pub fn new(value: f64, total: f64) -> Self {
        let percent = if total > 0.0 {
            (value / total * 100.0).clamp(0.0, 100.0)
        } else if value > 0.0 {
            100.0
        } else {
            0.0
        };
        Self {
            value,
            total,
            percent,
        }
    }

    /// Unfilled share of the ring.
    pub fn remaining_percent(&self) -> f64 {
        100.0 - self.percent
    }
}

/// Totals over a set of entries, plus the dashboard's spent/leftover donuts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total_income: f64,
    pub total_expenses: f64,
    /// Deposits minus withdrawals; negative when more was withdrawn.
    pub total_savings: f64,
    /// Income not yet spent, never below zero.
    pub leftover: f64,
    pub spent: DonutSegment,
    pub left: DonutSegment,
}

impl BudgetSummary {
    pub fn from_entries(entries: &[BudgetEntry]) -> Self {
        let total_income = sum_of(entries, BudgetEntryType::Income);
        let total_expenses = sum_of(entries, BudgetEntryType::Expense);
        let total_savings = sum_of(entries, BudgetEntryType::SavingsDeposit)
            - sum_of(entries, BudgetEntryType::SavingsWithdrawal);
        let leftover = (total_income - total_expenses).max(0.0);

        Self {
            total_income,
            total_expenses,
            total_savings,
            leftover,
            spent: DonutSegment::new(total_expenses, total_income),
            left: DonutSegment::new(leftover, total_income),
        }
    }
}

/// Sum of amounts for one entry type.
pub fn sum_of(entries: &[BudgetEntry], entry_type: BudgetEntryType) -> f64 {
    entries
        .iter()
        .filter(|e| e.entry_type == entry_type)
        .map(|e| e.amount)
        .sum()
}

/// Format an amount as dollars with two decimals and thousands separators.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

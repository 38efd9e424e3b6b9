//! In-memory view of the budget, backed by the local store.
//!
//! The ledger keeps a cached entry list for fast aggregation. Writes go to the
//! database first and only touch the cache once they have committed, so a
//! failed write never leaves the two out of step.

use std::path::Path;
use std::sync::Arc;

use super::summary::{self, BudgetSummary};
use super::validate::validate_amount;
use super::{BudgetEntry, BudgetEntryType, EntryCategory};
use crate::db::Database;
use crate::error::{BudgetError, Result};
use crate::storage;
use crate::storage::migration::migrate_from_legacy;

pub struct BudgetLedger {
    db: Arc<Database>,
    entries: Vec<BudgetEntry>,
    loaded: bool,
}

impl BudgetLedger {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            entries: Vec::new(),
            loaded: false,
        }
    }

    /// Load entries, importing the legacy file first if one is given.
    /// Subsequent calls are no-ops.
    pub fn load(&mut self, legacy_path: Option<&Path>) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        if let Some(path) = legacy_path {
            let migrated = migrate_from_legacy(&self.db, path);
            if !migrated.is_empty() {
                tracing::info!("Imported {} entries from legacy storage", migrated.len());
            }
        }

        self.entries = storage::get_all_entries(&self.db)?;
        self.loaded = true;
        tracing::debug!("Ledger loaded with {} entries", self.entries.len());
        Ok(())
    }

    /// Re-read entries from storage, e.g. after a server snapshot replaced them.
    pub fn reload(&mut self) -> Result<()> {
        self.entries = storage::get_all_entries(&self.db)?;
        self.loaded = true;
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn add_entry(
        &mut self,
        entry_type: BudgetEntryType,
        amount: f64,
        description: &str,
    ) -> Result<BudgetEntry> {
        let amount = validate_amount(amount)?;
        let entry = BudgetEntry::new(entry_type, amount, description);
        storage::add_entry(&self.db, &entry)?;
        self.entries.push(entry.clone());
        tracing::info!("Added {} entry {} ({})", entry_type, entry.id, amount);
        Ok(entry)
    }

    /// Change amount and description. Fails with `NotFound` if the ledger has
    /// no such entry; nothing is queued in that case.
    pub fn update_entry(&mut self, id: &str, amount: f64, description: &str) -> Result<BudgetEntry> {
        let amount = validate_amount(amount)?;
        let index = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| BudgetError::NotFound(id.to_string()))?;

        storage::update_entry(&self.db, id, amount, description)?;

        let entry = &mut self.entries[index];
        entry.amount = amount;
        entry.description = description.to_string();
        tracing::info!("Updated entry {}", id);
        Ok(entry.clone())
    }

    pub fn delete_entry(&mut self, id: &str) -> Result<()> {
        if !self.entries.iter().any(|e| e.id == id) {
            return Err(BudgetError::NotFound(id.to_string()));
        }
        storage::remove_entry(&self.db, id)?;
        self.entries.retain(|e| e.id != id);
        tracing::info!("Deleted entry {}", id);
        Ok(())
    }

    pub fn entries(&self) -> &[BudgetEntry] {
        &self.entries
    }

    pub fn find(&self, id: &str) -> Option<&BudgetEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn entries_in(&self, category: EntryCategory) -> Vec<&BudgetEntry> {
        self.entries
            .iter()
            .filter(|e| e.entry_type.category() == category)
            .collect()
    }

    pub fn income_entries(&self) -> Vec<&BudgetEntry> {
        self.entries_in(EntryCategory::Income)
    }

    pub fn expense_entries(&self) -> Vec<&BudgetEntry> {
        self.entries_in(EntryCategory::Expense)
    }

    pub fn savings_entries(&self) -> Vec<&BudgetEntry> {
        self.entries_in(EntryCategory::Savings)
    }

    pub fn total_income(&self) -> f64 {
        summary::sum_of(&self.entries, BudgetEntryType::Income)
    }

    pub fn total_expenses(&self) -> f64 {
        summary::sum_of(&self.entries, BudgetEntryType::Expense)
    }

    pub fn total_savings(&self) -> f64 {
        summary::sum_of(&self.entries, BudgetEntryType::SavingsDeposit)
            - summary::sum_of(&self.entries, BudgetEntryType::SavingsWithdrawal)
    }

    pub fn summary(&self) -> BudgetSummary {
        BudgetSummary::from_entries(&self.entries)
    }
}

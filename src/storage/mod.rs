//! Local entry store.
//!
//! Every mutation writes the entry row and appends the matching sync-queue
//! operation in one transaction, so the queue never disagrees with what was
//! stored locally.

pub mod migration;
pub mod queue;

use rusqlite::{Connection, OptionalExtension, Row};

use crate::budget::{BudgetEntry, BudgetEntryType};
use crate::db::Database;
use crate::error::Result;
use queue::{SyncOpType, SyncPayload};

fn entry_from_row(row: &Row<'_>) -> rusqlite::Result<BudgetEntry> {
    Ok(BudgetEntry {
        id: row.get(0)?,
        amount: row.get(1)?,
        description: row.get(2)?,
        entry_type: row.get::<_, BudgetEntryType>(3)?,
        created_at: row.get(4)?,
    })
}

pub(crate) fn put_entry(conn: &Connection, entry: &BudgetEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO entries (id, amount, description, entry_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(id) DO UPDATE SET
            amount = excluded.amount,
            description = excluded.description,
            entry_type = excluded.entry_type,
            created_at = excluded.created_at",
        rusqlite::params![
            entry.id,
            entry.amount,
            entry.description,
            entry.entry_type,
            entry.created_at
        ],
    )?;
    Ok(())
}

/// All stored entries, oldest first.
pub fn get_all_entries(db: &Database) -> Result<Vec<BudgetEntry>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, amount, description, entry_type, created_at
             FROM entries ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map([], entry_from_row)?;
        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    })
}

pub fn get_entry(db: &Database, id: &str) -> Result<Option<BudgetEntry>> {
    db.with_conn(|conn| {
        let entry = conn
            .query_row(
                "SELECT id, amount, description, entry_type, created_at
                 FROM entries WHERE id = ?1",
                rusqlite::params![id],
                entry_from_row,
            )
            .optional()?;
        Ok(entry)
    })
}

/// Store a new entry and queue an `add` carrying all of its fields.
pub fn add_entry(db: &Database, entry: &BudgetEntry) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        put_entry(&tx, entry)?;
        queue::enqueue(
            &tx,
            SyncOpType::Add,
            &SyncPayload {
                entry_id: entry.id.clone(),
                amount: Some(entry.amount),
                description: Some(entry.description.clone()),
                entry_type: Some(entry.entry_type),
                created_at: Some(entry.created_at.clone()),
            },
        )?;
        tx.commit()?;
        Ok(())
    })
}

/// Overwrite amount and description of an entry.
///
/// The `update` operation is queued even when the entry is not stored
/// locally; the server may still know it. Returns whether a local row changed.
pub fn update_entry(db: &Database, id: &str, amount: f64, description: &str) -> Result<bool> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE entries SET amount = ?1, description = ?2 WHERE id = ?3",
            rusqlite::params![amount, description, id],
        )?;
        queue::enqueue(
            &tx,
            SyncOpType::Update,
            &SyncPayload {
                entry_id: id.to_string(),
                amount: Some(amount),
                description: Some(description.to_string()),
                ..Default::default()
            },
        )?;
        tx.commit()?;
        Ok(changed > 0)
    })
}

/// Delete an entry and queue a `delete`. Missing entries are not an error.
pub fn remove_entry(db: &Database, id: &str) -> Result<bool> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM entries WHERE id = ?1", rusqlite::params![id])?;
        queue::enqueue(
            &tx,
            SyncOpType::Delete,
            &SyncPayload {
                entry_id: id.to_string(),
                ..Default::default()
            },
        )?;
        tx.commit()?;
        Ok(removed > 0)
    })
}

/// Replace every local entry with a server snapshot. The sync queue is left alone.
pub fn replace_all_entries(db: &Database, entries: &[BudgetEntry]) -> Result<()> {
    db.with_conn(|conn| {
        let tx = conn.unchecked_transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        for entry in entries {
            put_entry(&tx, entry)?;
        }
        tx.commit()?;
        tracing::info!("Replaced local entries with snapshot of {}", entries.len());
        Ok(())
    })
}

//! Local log of mutations awaiting replay to the sync API.
//!
//! Rows are appended in the same transaction as the entry change they
//! describe and removed one by one as the server acknowledges them.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::budget::BudgetEntryType;
use crate::db::Database;
use crate::error::{BudgetError, Result};

/// Kind of queued mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOpType {
    Add,
    Update,
    Delete,
}

impl SyncOpType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOpType::Add => "add",
            SyncOpType::Update => "update",
            SyncOpType::Delete => "delete",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "add" => Some(SyncOpType::Add),
            "update" => Some(SyncOpType::Update),
            "delete" => Some(SyncOpType::Delete),
            _ => None,
        }
    }
}

/// Fields carried by a queued mutation. Only `entry_id` is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub entry_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<BudgetEntryType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// A queued mutation, serialized as-is in the body of `POST /sync`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOperation {
    pub id: i64,
    #[serde(rename = "type")]
    pub op_type: SyncOpType,
    pub payload: SyncPayload,
    /// Enqueue time in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Append a mutation. Callers pass the connection (or transaction) that also
/// carries the entry change so both commit together.
pub(crate) fn enqueue(conn: &Connection, op_type: SyncOpType, payload: &SyncPayload) -> Result<i64> {
    let payload_json = serde_json::to_string(payload)?;
    let timestamp = chrono::Utc::now().timestamp_millis();
    conn.execute(
        "INSERT INTO sync_queue (op_type, payload, timestamp) VALUES (?1, ?2, ?3)",
        rusqlite::params![op_type.as_str(), payload_json, timestamp],
    )?;
    let id = conn.last_insert_rowid();
    tracing::debug!("Queued {} for entry {} (op {})", op_type.as_str(), payload.entry_id, id);
    Ok(id)
}

/// All pending operations in the order they were enqueued.
///
/// Ordered by id rather than `timestamp`: ids are never reused, while the
/// wall clock can step backwards between two enqueues.
pub fn get_sync_queue(db: &Database) -> Result<Vec<SyncOperation>> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT id, op_type, payload, timestamp FROM sync_queue ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;
        let mut results = Vec::new();
        for row in rows {
            let (id, op_type, payload, timestamp) = row?;
            let op_type = SyncOpType::parse(&op_type).ok_or_else(|| {
                BudgetError::Sync(format!("Unknown queued operation '{}' (op {})", op_type, id))
            })?;
            results.push(SyncOperation {
                id,
                op_type,
                payload: serde_json::from_str(&payload)?,
                timestamp,
            });
        }
        Ok(results)
    })
}

/// Drop one acknowledged operation.
pub fn remove_sync_queue_item(db: &Database, id: i64) -> Result<()> {
    db.with_conn(|conn| {
        conn.execute("DELETE FROM sync_queue WHERE id = ?1", rusqlite::params![id])?;
        Ok(())
    })
}

/// Drop every pending operation.
pub fn clear_sync_queue(db: &Database) -> Result<()> {
    db.with_conn(|conn| {
        let removed = conn.execute("DELETE FROM sync_queue", [])?;
        tracing::info!("Cleared {} queued sync operations", removed);
        Ok(())
    })
}

pub fn queue_len(db: &Database) -> Result<usize> {
    db.with_conn(|conn| {
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sync_queue", [], |row| row.get(0))?;
        Ok(count as usize)
    })
}

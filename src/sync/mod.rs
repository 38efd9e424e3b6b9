//! Server sync: replay queued mutations, then adopt the server's snapshot.
//!
//! Strategy:
//! 1. Push queued operations one at a time, oldest first.
//! 2. Stop at the first failure (HTTP or network); the rest stay queued.
//! 3. Fetch the full entry list and overwrite local entries with it.
//!
//! With no API configured every entry point is a no-op and mutations simply
//! accumulate in the queue.

pub mod http;
pub mod monitor;

#[cfg(test)]
pub(crate) mod fake;

use std::future::Future;

use serde::Serialize;

use crate::budget::BudgetEntry;
use crate::db::Database;
use crate::error::Result;
use crate::storage::{self, queue};
use crate::storage::queue::SyncOperation;

/// Wire access to the sync API.
pub trait SyncTransport: Send + Sync {
    /// Deliver one queued operation. Any error means "not delivered".
    fn push(&self, op: &SyncOperation) -> impl Future<Output = Result<()>> + Send;

    /// Fetch the server's complete entry list.
    fn fetch_snapshot(&self) -> impl Future<Output = Result<Vec<BudgetEntry>>> + Send;

    /// Whether the API answers at all.
    fn probe(&self) -> impl Future<Output = bool> + Send;
}

/// Outcome of one sync attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub api_available: bool,
    /// Operations delivered and removed from the queue.
    pub replayed: usize,
    /// Operations still queued afterwards.
    pub remaining: usize,
    /// Replay hit a failure before draining the queue.
    pub stopped_early: bool,
    /// Local entries were replaced with the server snapshot.
    pub snapshot_applied: bool,
}

pub struct SyncService<T> {
    transport: Option<T>,
}

impl<T: SyncTransport> SyncService<T> {
    pub fn new(transport: Option<T>) -> Self {
        Self { transport }
    }

    /// A service with no API configured.
    pub fn disabled() -> Self {
        Self { transport: None }
    }

    pub fn is_api_available(&self) -> bool {
        self.transport.is_some()
    }

    /// Whether the API is reachable right now. Always false when not configured.
    pub async fn probe(&self) -> bool {
        match &self.transport {
            Some(transport) => transport.probe().await,
            None => false,
        }
    }

    /// Sync local changes with the server. No-op until an API is configured.
    pub async fn start_sync(&self, db: &Database) -> Result<SyncReport> {
        if !self.is_api_available() {
            tracing::debug!("Sync skipped: no API configured");
            return Ok(SyncReport {
                remaining: queue::queue_len(db)?,
                ..Default::default()
            });
        }
        self.replay_queue(db).await
    }

    /// Push queued operations in order, then resolve conflicts with a snapshot.
    pub async fn replay_queue(&self, db: &Database) -> Result<SyncReport> {
        let Some(transport) = &self.transport else {
            return Ok(SyncReport {
                remaining: queue::queue_len(db)?,
                ..Default::default()
            });
        };

        let pending = queue::get_sync_queue(db)?;
        if pending.is_empty() {
            return Ok(SyncReport {
                api_available: true,
                ..Default::default()
            });
        }

        tracing::info!("Replaying {} queued operations", pending.len());
        let mut replayed = 0;
        let mut stopped_early = false;
        for op in &pending {
            match transport.push(op).await {
                Ok(()) => {
                    queue::remove_sync_queue_item(db, op.id)?;
                    replayed += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        "Sync of op {} ({} {}) failed, retrying later: {}",
                        op.id,
                        op.op_type.as_str(),
                        op.payload.entry_id,
                        e
                    );
                    stopped_early = true;
                    break;
                }
            }
        }

        let snapshot_applied = self.snapshot_from_server(db).await;

        Ok(SyncReport {
            api_available: true,
            replayed,
            remaining: pending.len() - replayed,
            stopped_early,
            snapshot_applied,
        })
    }

    /// Overwrite local entries with the server's. On failure local data is
    /// kept as-is (stale but usable) and `false` is returned.
    pub async fn snapshot_from_server(&self, db: &Database) -> bool {
        let Some(transport) = &self.transport else {
            return false;
        };

        let entries = match transport.fetch_snapshot().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!("Snapshot fetch failed, keeping local entries: {}", e);
                return false;
            }
        };

        match storage::replace_all_entries(db, &entries) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to apply server snapshot: {}", e);
                false
            }
        }
    }
}

/// Throw away every queued operation without replaying it.
pub fn discard_queue(db: &Database) -> Result<()> {
    queue::clear_sync_queue(db)
}

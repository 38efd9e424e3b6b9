//! In-process transport for sync tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::SyncTransport;
use crate::budget::BudgetEntry;
use crate::error::{BudgetError, Result};
use crate::storage::queue::SyncOperation;

#[derive(Default)]
pub(crate) struct FakeTransport {
    pushed: Mutex<Vec<SyncOperation>>,
    /// Accept this many pushes, then fail every later one.
    fail_after: Option<usize>,
    /// `None` makes snapshot fetches fail.
    snapshot: Option<Vec<BudgetEntry>>,
    snapshot_calls: AtomicUsize,
    reachable: AtomicBool,
}

impl FakeTransport {
    pub(crate) fn with_snapshot(snapshot: Vec<BudgetEntry>) -> Self {
        Self {
            snapshot: Some(snapshot),
            reachable: AtomicBool::new(true),
            ..Default::default()
        }
    }

    pub(crate) fn failing_after(mut self, accepted: usize) -> Self {
        self.fail_after = Some(accepted);
        self
    }

    pub(crate) fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub(crate) fn pushed(&self) -> Vec<SyncOperation> {
        self.pushed.lock().unwrap().clone()
    }

    pub(crate) fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }
}

impl SyncTransport for FakeTransport {
    async fn push(&self, op: &SyncOperation) -> Result<()> {
        let mut pushed = self.pushed.lock().unwrap();
        if self.fail_after.is_some_and(|limit| pushed.len() >= limit) {
            return Err(BudgetError::Sync("server returned 503".into()));
        }
        pushed.push(op.clone());
        Ok(())
    }

    async fn fetch_snapshot(&self) -> Result<Vec<BudgetEntry>> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .clone()
            .ok_or_else(|| BudgetError::Sync("snapshot unavailable".into()))
    }

    async fn probe(&self) -> bool {
        self.reachable.load(Ordering::SeqCst)
    }
}

//! Connectivity monitor. Stands in for the browser's `online`/`offline`
//! events when running as a long-lived process.
//!
//! Polls the API on a fixed interval. A transition to online triggers a full
//! sync; while online, any mutations queued in the meantime are flushed on the
//! next tick.

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::MissedTickBehavior;

use super::{SyncService, SyncTransport};
use crate::db::Database;
use crate::error::Result;
use crate::storage::queue;

pub const OFFLINE_MESSAGE: &str = "You're offline — changes will sync when you reconnect.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Unknown,
    Online,
    Offline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    WentOffline,
    Reconnected,
}

impl Connectivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Connectivity::Unknown => "unknown",
            Connectivity::Online => "online",
            Connectivity::Offline => "offline",
        }
    }

    /// Record a probe result and report what changed.
    pub fn observe(&mut self, reachable: bool) -> Transition {
        let next = if reachable {
            Connectivity::Online
        } else {
            Connectivity::Offline
        };
        let transition = match (*self, next) {
            (Connectivity::Online, Connectivity::Online)
            | (Connectivity::Offline, Connectivity::Offline) => Transition::Unchanged,
            (_, Connectivity::Online) => Transition::Reconnected,
            _ => Transition::WentOffline,
        };
        *self = next;
        transition
    }
}

pub struct ConnectivityMonitor {
    interval: Duration,
    state: Connectivity,
}

impl ConnectivityMonitor {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: Connectivity::Unknown,
        }
    }

    pub fn state(&self) -> Connectivity {
        self.state
    }

    /// Probe once and sync if warranted. Sync failures are logged, not returned;
    /// only local database errors propagate.
    pub async fn tick<T: SyncTransport>(
        &mut self,
        service: &SyncService<T>,
        db: &Database,
    ) -> Result<Transition> {
        let reachable = service.probe().await;
        let transition = self.state.observe(reachable);

        let should_sync = match transition {
            Transition::Reconnected => {
                tracing::info!("Sync API reachable, syncing");
                true
            }
            Transition::WentOffline => {
                tracing::warn!("{}", OFFLINE_MESSAGE);
                false
            }
            Transition::Unchanged => {
                self.state == Connectivity::Online && queue::queue_len(db)? > 0
            }
        };

        if should_sync {
            match service.start_sync(db).await {
                Ok(report) => tracing::info!(
                    "Sync finished: {} replayed, {} remaining, snapshot {}",
                    report.replayed,
                    report.remaining,
                    if report.snapshot_applied { "applied" } else { "skipped" }
                ),
                Err(e) => tracing::error!("Sync failed: {}", e),
            }
        }

        Ok(transition)
    }

    /// Poll until `shutdown` resolves.
    pub async fn run<T, F>(
        &mut self,
        service: &SyncService<T>,
        db: &Database,
        shutdown: F,
    ) -> Result<()>
    where
        T: SyncTransport,
        F: Future<Output = ()>,
    {
        if !service.is_api_available() {
            tracing::warn!("No sync API configured, nothing to watch");
            return Ok(());
        }

        tokio::pin!(shutdown);
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!("Watching sync API every {:?}", self.interval);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Connectivity monitor stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.tick(service, db).await?;
                }
            }
        }
    }
}

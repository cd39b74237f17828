//! Periodic retention sweep for token records.
//!
//! Two idempotent, order-independent steps: drop active records whose
//! expiry has passed, and drop revoked-history records older than the
//! grace window. Failures are logged and swallowed — a missed sweep
//! self-heals on the next tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use super::store::SessionStore;

/// Retention sweeper for expired and aged-out token records.
pub struct Sweeper {
    store: Arc<SessionStore>,
    interval: Duration,
    revoked_retention_secs: u64,
}

/// Stops the background sweep on request; owned by the process lifecycle.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: tokio::task::JoinHandle<()>,
}

impl SweeperHandle {
    /// Signal the sweep loop to stop and wait for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

impl Sweeper {
    pub fn new(store: Arc<SessionStore>, interval_secs: u64, revoked_retention_secs: u64) -> Self {
        Self {
            store,
            interval: Duration::from_secs(interval_secs.max(1)),
            revoked_retention_secs,
        }
    }

    /// Run one sweep now.
    pub fn sweep_once(&self) {
        let expired = match self.store.purge_expired_active() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to purge expired refresh tokens");
                return;
            }
        };
        let revoked = match self.store.purge_old_revoked(self.revoked_retention_secs) {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!(error = %e, "failed to purge revoked-token history");
                return;
            }
        };
        tracing::info!(expired, revoked, "token retention sweep done");
    }

    /// Spawn the periodic sweep loop. The first sweep runs immediately.
    pub fn spawn(self) -> SweeperHandle {
        let (tx, mut rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep_once(),
                    changed = rx.changed() => {
                        if changed.is_err() || *rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("retention sweeper stopped");
        });
        SweeperHandle { shutdown: tx, task }
    }
}

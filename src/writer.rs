//! Background save writer.
//!
//! The store pushes a snapshot after every applied command and moves on.
//! One spawned task drains the queue, keeps only the newest snapshot, and
//! writes it on the blocking pool. Failures are logged, never retried.

use crate::gateway::PersistenceGateway;
use crate::store::Snapshot;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

pub(crate) struct SaveWriter {
    tx: mpsc::UnboundedSender<Snapshot>,
    handle: JoinHandle<()>,
}

impl SaveWriter {
    /// Spawn the writer on the current tokio runtime.
    pub(crate) fn spawn(gateway: Arc<dyn PersistenceGateway>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run(gateway, rx));
        SaveWriter { tx, handle }
    }

    /// Queue a snapshot. Never blocks.
    pub(crate) fn submit(&self, snapshot: Snapshot) {
        if let Err(e) = self.tx.send(snapshot) {
            error!(revision = e.0.revision(), "save writer is gone, snapshot dropped");
        }
    }

    /// Close the queue and wait until everything queued has been written.
    pub(crate) async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            error!(error = %e, "save writer ended abnormally");
        }
    }
}

async fn run(gateway: Arc<dyn PersistenceGateway>, mut rx: mpsc::UnboundedReceiver<Snapshot>) {
    while let Some(mut snapshot) = rx.recv().await {
        // Every snapshot is a full copy, so older queued ones can be skipped.
        while let Ok(newer) = rx.try_recv() {
            snapshot = newer;
        }

        let revision = snapshot.revision();
        let gw = Arc::clone(&gateway);
        match tokio::task::spawn_blocking(move || gw.save(&snapshot)).await {
            Ok(Ok(())) => debug!(revision, "saved tasks"),
            Ok(Err(e)) => error!(revision, error = %e, "failed to save tasks"),
            Err(e) => error!(revision, error = %e, "save task aborted"),
        }
    }
    debug!("save writer stopped");
}

// ── Tests ──────────────────────────────────────────────────────

//! Persistence boundary between the store and device storage.
//!
//! The store never touches storage directly. It hands full snapshots to a
//! [`PersistenceGateway`] and reads one back at startup. Implementations:
//! [`crate::persist::SaveFile`] (redb on disk) and [`MemoryGateway`].

use crate::codec;
use crate::store::Snapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Blocking load/save of the whole task sequence.
///
/// Called off the UI path: the store runs both on tokio's blocking pool.
pub trait PersistenceGateway: Send + Sync {
    /// Returns the last saved snapshot, or `None` if nothing was ever saved.
    fn load(&self) -> Result<Option<Snapshot>, PersistError>;

    /// Overwrites the stored snapshot.
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError>;
}

// ── Errors ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("storage: {0}")]
    Storage(String),
    #[error("encode: {0}")]
    Encode(String),
    #[error("decode: {0}")]
    Decode(String),
    #[error("unavailable: {0}")]
    Unavailable(String),
}

// ── In-memory gateway ──────────────────────────────────────────

/// Gateway that keeps the encoded payload in process memory.
///
/// Clones share the same slot, so a test can keep one handle and give the
/// other to a store.
#[derive(Clone, Default)]
pub struct MemoryGateway {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    slot: Mutex<Option<(u64, Vec<u8>)>>,
    fail_loads: AtomicBool,
    fail_saves: AtomicBool,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw bytes, as if a previous process had saved them.
    pub fn with_raw(revision: u64, bytes: Vec<u8>) -> Self {
        let gw = Self::new();
        *gw.lock_slot() = Some((revision, bytes));
        gw
    }

    pub fn fail_loads(&self, fail: bool) {
        self.inner.fail_loads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_saves(&self, fail: bool) {
        self.inner.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Raw stored payload, if any.
    pub fn raw(&self) -> Option<Vec<u8>> {
        self.lock_slot().as_ref().map(|(_, bytes)| bytes.clone())
    }

    /// Revision of the stored payload, if any.
    pub fn revision(&self) -> Option<u64> {
        self.lock_slot().as_ref().map(|(rev, _)| *rev)
    }

    fn lock_slot(&self) -> std::sync::MutexGuard<'_, Option<(u64, Vec<u8>)>> {
        // A panic while holding the lock cannot leave the slot half-written.
        self.inner.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self) -> Result<Option<Snapshot>, PersistError> {
        if self.inner.fail_loads.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory gateway load disabled".into()));
        }
        match self.lock_slot().as_ref() {
            Some((revision, bytes)) => {
                let tasks = codec::decode(bytes)?;
                Ok(Some(Snapshot::new(*revision, tasks)))
            }
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        if self.inner.fail_saves.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("memory gateway save disabled".into()));
        }
        let bytes = codec::encode(snapshot.tasks())?;
        *self.lock_slot() = Some((snapshot.revision(), bytes));
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────

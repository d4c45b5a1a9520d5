//! Task list ↔ redb persistence.
//!
//! redb is the device's key-value storage: one payload per key, read on
//! boot, overwritten with the full sequence after every mutation. Never
//! queried at runtime, the store is the runtime truth.

use crate::codec;
use crate::gateway::{PersistError, PersistenceGateway};
use crate::settings::Settings;
use crate::store::Snapshot;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
#[cfg(feature = "profile")]
use std::time::Instant;

const STORAGE: TableDefinition<&str, &[u8]> = TableDefinition::new("storage");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

pub const DEFAULT_KEY: &str = "tasks";

/// Thin handle to the redb file. Cloneable (Arc inside).
#[derive(Clone)]
pub struct SaveFile {
    db: Arc<Database>,
    key: String,
}

impl SaveFile {
    /// Open (or create) the save file at the given path, using the default key.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        Self::open_keyed(path, DEFAULT_KEY)
    }

    pub fn open_with(settings: &Settings) -> Result<Self, PersistError> {
        Self::open_keyed(&settings.save_file, &settings.storage_key)
    }

    /// Open (or create) the save file, storing the task list under `key`.
    /// Creates tables if they don't exist.
    pub fn open_keyed(path: impl AsRef<Path>, key: &str) -> Result<Self, PersistError> {
        let db = Database::create(path.as_ref())?;

        let txn = db.begin_write()?;
        {
            let _ = txn.open_table(STORAGE)?;
            let _ = txn.open_table(META)?;
        }
        txn.commit()?;

        Ok(SaveFile { db: Arc::new(db), key: key.to_string() })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn revision_key(&self) -> String {
        format!("{}.revision", self.key)
    }
}

impl PersistenceGateway for SaveFile {
    fn load(&self) -> Result<Option<Snapshot>, PersistError> {
        let txn = self.db.begin_read()?;

        let storage = txn.open_table(STORAGE)?;
        let tasks = match storage.get(self.key.as_str())? {
            Some(bytes) => codec::decode(bytes.value())?,
            None => return Ok(None),
        };

        let meta = txn.open_table(META)?;
        let revision = meta
            .get(self.revision_key().as_str())?
            .map(|v| v.value())
            .unwrap_or(0);

        Ok(Some(Snapshot::new(revision, tasks)))
    }

    /// Write the snapshot and its revision in one transaction, replacing
    /// whatever is stored. Ordering is the writer's job.
    fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        #[cfg(feature = "profile")]
        let start = Instant::now();

        let bytes = codec::encode(snapshot.tasks())?;

        let txn = self.db.begin_write()?;
        {
            let mut storage = txn.open_table(STORAGE)?;
            let mut meta = txn.open_table(META)?;
            storage.insert(self.key.as_str(), bytes.as_slice())?;
            meta.insert(self.revision_key().as_str(), snapshot.revision())?;
        }
        txn.commit()?;

        #[cfg(feature = "profile")]
        tracing::debug!(
            bytes = bytes.len(),
            elapsed_us = start.elapsed().as_micros() as u64,
            "save committed"
        );
        Ok(())
    }
}

// redb 2.x has many error types. Blanket them all into PersistError::Storage.
macro_rules! from_redb {
    ($($t:ty),*) => {
        $(impl From<$t> for PersistError {
            fn from(e: $t) -> Self { PersistError::Storage(e.to_string()) }
        })*
    };
}

from_redb!(
    redb::Error,
    redb::DatabaseError,
    redb::TableError,
    redb::TransactionError,
    redb::StorageError,
    redb::CommitError
);

// ── Tests ──────────────────────────────────────────────────────

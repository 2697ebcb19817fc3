//! Snapshot persistence.
//!
//! The whole database is one JSON document stored under a single key. Every
//! operation is a full read-modify-write of that document; the last writer
//! wins. Unreadable or corrupt documents are replaced by an empty snapshot
//! and never reported to callers.

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, warn};

use crate::model::Snapshot;

mod backend;
pub use backend::{FileStorage, MemoryStorage, Storage};

/// Storage key of the database document.
pub const DB_KEY: &str = "s_money_db_v1";

/// Errors raised by storage backends. Absorbed by [`SnapshotStore`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("corrupt snapshot: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Loads and saves the [`Snapshot`] through a [`Storage`] backend.
#[derive(Debug)]
pub struct SnapshotStore<S> {
    storage: S,
    key: String,
}

impl<S: Storage> SnapshotStore<S> {
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, DB_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load the current snapshot, falling back to an empty one.
    pub fn load(&self) -> Snapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                debug!(key = %self.key, "no stored snapshot, starting fresh");
                Snapshot::default()
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "unreadable snapshot, resetting to defaults");
                Snapshot::default()
            }
        }
    }

    /// Overwrite the stored snapshot. Write failures are logged and dropped.
    pub fn save(&mut self, snapshot: &Snapshot) {
        if let Err(e) = self.try_save(snapshot) {
            warn!(key = %self.key, error = %e, "failed to save snapshot");
        }
    }

    fn try_load(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(raw) = self.storage.get(&self.key)? else {
            return Ok(None);
        };
        // a stored literal `null` counts as absent
        let snapshot: Option<Snapshot> = serde_json::from_str(&raw)?;
        Ok(snapshot)
    }

    fn try_save(&mut self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let json = serde_json::to_string(snapshot)?;
        self.storage.set(&self.key, &json)?;
        debug!(
            key = %self.key,
            users = snapshot.users.len(),
            investments = snapshot.investments.len(),
            "saved snapshot"
        );
        Ok(())
    }
}

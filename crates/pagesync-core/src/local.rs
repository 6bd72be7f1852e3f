//! Durable local key/value storage
//!
//! A small JSON-file-per-key store under the data directory. Each well-known
//! key is independently readable and writable; there is no transactional
//! guarantee across keys, and re-writing the same value is harmless. Writes
//! go through a temp file and rename so a crash never leaves a torn file.

use std::fs;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::document::ContentDocument;
use crate::error::{SyncError, SyncResult};
use crate::state::SyncState;

/// Key holding the last applied content document
const KEY_CONTENT: &str = "content.json";
/// Key holding the last-sync timestamp baseline (epoch ms)
const KEY_BASELINE: &str = "baseline.json";
/// Key holding the serialized reconciler state
const KEY_SYNC_STATE: &str = "sync_state.json";
/// Key holding the pending-update marker written by the storage channel
const KEY_PENDING: &str = "pending.json";

/// JSON-file-backed durable store under a data directory
#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    /// Open the store, creating the data directory if needed
    pub fn open(dir: PathBuf) -> SyncResult<Self> {
        fs::create_dir_all(&dir).map_err(|source| SyncError::Storage {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The directory backing this store
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn read_key<T: DeserializeOwned>(&self, key: &str) -> SyncResult<Option<T>> {
        let path = self.dir.join(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path).map_err(|source| SyncError::Storage {
            path: path.clone(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&raw)?))
    }

    fn write_key<T: Serialize>(&self, key: &str, value: &T) -> SyncResult<()> {
        let path = self.dir.join(key);
        let tmp = self.dir.join(format!("{}.tmp", key));
        let json = serde_json::to_string_pretty(value)?;

        fs::write(&tmp, json).map_err(|source| SyncError::Storage {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| SyncError::Storage { path, source })?;
        Ok(())
    }

    /// Load the last applied content document, if any
    pub fn load_content(&self) -> SyncResult<Option<ContentDocument>> {
        self.read_key(KEY_CONTENT)
    }

    /// Persist the applied content document
    pub fn save_content(&self, document: &ContentDocument) -> SyncResult<()> {
        self.write_key(KEY_CONTENT, document)
    }

    /// Last known remote modification baseline in epoch ms (0 if unset)
    pub fn baseline(&self) -> SyncResult<u64> {
        Ok(self.read_key::<u64>(KEY_BASELINE)?.unwrap_or(0))
    }

    /// Record the remote modification timestamp of the applied artifact
    pub fn set_baseline(&self, epoch_ms: u64) -> SyncResult<()> {
        self.write_key(KEY_BASELINE, &epoch_ms)
    }

    /// Restore persisted reconciler state
    ///
    /// `is_running` and `next_check` always restore to their stopped values:
    /// a restarted process must explicitly re-arm the timer.
    pub fn load_sync_state(&self) -> SyncResult<SyncState> {
        let mut state: SyncState = self.read_key(KEY_SYNC_STATE)?.unwrap_or_default();
        state.is_running = false;
        state.next_check = None;
        Ok(state)
    }

    /// Persist reconciler state
    pub fn save_sync_state(&self, state: &SyncState) -> SyncResult<()> {
        self.write_key(KEY_SYNC_STATE, state)
    }

    /// Write the "pending update, not yet processed" marker
    pub fn set_pending<T: Serialize>(&self, marker: &T) -> SyncResult<()> {
        self.write_key(KEY_PENDING, marker)
    }

    /// Read and clear the pending-update marker
    pub fn take_pending<T: DeserializeOwned>(&self) -> SyncResult<Option<T>> {
        let value = self.read_key(KEY_PENDING)?;
        if value.is_some() {
            let path = self.dir.join(KEY_PENDING);
            fs::remove_file(&path).map_err(|source| SyncError::Storage { path, source })?;
        }
        Ok(value)
    }
}

//! Scriptable in-memory remote store for tests

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::{RemoteFileHandle, RemoteStore};
use crate::error::{SyncError, SyncResult};

/// In-memory [`RemoteStore`] whose behavior tests can script
#[derive(Debug, Default)]
pub(crate) struct MockRemote {
    /// Handle returned by `metadata`; None simulates a missing artifact
    pub handle: Mutex<Option<RemoteFileHandle>>,
    /// Body returned by `download`
    pub body: Mutex<String>,
    /// Results returned by `search_by_name`
    pub search_results: Mutex<Vec<RemoteFileHandle>>,
    /// Fail the next N `metadata` calls with a retryable error
    pub fail_metadata: AtomicU32,
    /// Fail the next N `download` calls with a retryable error
    pub fail_downloads: AtomicU32,
    /// Answer every `metadata` call with an auth error
    pub metadata_auth_error: AtomicBool,
    /// Delay applied before `download` resolves
    pub download_delay: Mutex<Option<Duration>>,
    pub metadata_calls: AtomicU32,
    pub download_calls: AtomicU32,
    pub search_calls: AtomicU32,
    /// Recorded `(file_id, body)` upload calls
    pub uploads: Mutex<Vec<(Option<String>, String)>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(handle: RemoteFileHandle, body: impl Into<String>) -> Self {
        let mock = Self::new();
        *mock.handle.lock().unwrap() = Some(handle);
        *mock.body.lock().unwrap() = body.into();
        mock
    }

    fn transient() -> SyncError {
        SyncError::http(503, "simulated outage")
    }
}

/// Build a handle with the given id and modification time
pub(crate) fn handle(id: &str, modified_at: u64) -> RemoteFileHandle {
    RemoteFileHandle {
        id: id.to_string(),
        name: "site-content.json".to_string(),
        modified_at,
        size: Some(1024),
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn metadata(&self, _file_id: &str) -> SyncResult<Option<RemoteFileHandle>> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);

        if self.metadata_auth_error.load(Ordering::SeqCst) {
            return Err(SyncError::Auth {
                reason: "simulated permission failure".to_string(),
            });
        }
        if self.fail_metadata.load(Ordering::SeqCst) > 0 {
            self.fail_metadata.fetch_sub(1, Ordering::SeqCst);
            return Err(Self::transient());
        }
        Ok(self.handle.lock().unwrap().clone())
    }

    async fn search_by_name(&self, _name: &str) -> SyncResult<Vec<RemoteFileHandle>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn download(&self, _file_id: &str) -> SyncResult<String> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.download_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_downloads.load(Ordering::SeqCst) > 0 {
            self.fail_downloads.fetch_sub(1, Ordering::SeqCst);
            return Err(Self::transient());
        }
        Ok(self.body.lock().unwrap().clone())
    }

    async fn upload(
        &self,
        file_id: Option<&str>,
        name: &str,
        body: &str,
        _description: &str,
    ) -> SyncResult<RemoteFileHandle> {
        self.uploads
            .lock()
            .unwrap()
            .push((file_id.map(String::from), body.to_string()));

        // Mirror the real adapters: replace when the id resolves to the
        // current artifact, otherwise fall back to creating a fresh one.
        let existing = self.handle.lock().unwrap().clone();
        let next = match (file_id, existing) {
            (Some(id), Some(current)) if current.id == id => RemoteFileHandle {
                modified_at: current.modified_at + 1,
                ..current
            },
            _ => RemoteFileHandle {
                id: format!("created-{}", self.uploads.lock().unwrap().len()),
                name: name.to_string(),
                modified_at: crate::state::epoch_ms(),
                size: Some(body.len() as u64),
            },
        };
        *self.handle.lock().unwrap() = Some(next.clone());
        *self.body.lock().unwrap() = body.to_string();
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_with_stale_id_creates_fresh_artifact() {
        let remote = MockRemote::with_file(handle("f1", 1_000), "{}");

        let fresh = remote
            .upload(Some("stale-id"), "site-content.json", "{}", "republish")
            .await
            .unwrap();
        assert_ne!(fresh.id, "stale-id");
        assert_ne!(fresh.id, "f1");

        // The fresh artifact is now what metadata reports
        let current = remote.metadata(&fresh.id).await.unwrap().unwrap();
        assert_eq!(current.id, fresh.id);
    }

    #[tokio::test]
    async fn test_upload_with_matching_id_replaces_in_place() {
        let remote = MockRemote::with_file(handle("f1", 1_000), "{}");

        let replaced = remote
            .upload(Some("f1"), "site-content.json", r#"{"v":2}"#, "republish")
            .await
            .unwrap();
        assert_eq!(replaced.id, "f1");
        assert!(replaced.modified_at > 1_000);
        assert_eq!(remote.download("f1").await.unwrap(), r#"{"v":2}"#);
    }
}

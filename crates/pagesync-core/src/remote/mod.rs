//! Remote content backends
//!
//! A [`RemoteStore`] is a stateless gateway to wherever the published
//! content artifact lives: a cloud-drive JSON blob or a file in a
//! source-control repository. Adapters only make network calls; retry policy
//! belongs to the reconciler.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{Backend, Config};
use crate::error::{SyncError, SyncResult};

pub mod drive;
pub mod github;

#[cfg(test)]
pub(crate) mod mock;

pub use drive::DriveStore;
pub use github::GithubStore;

/// Identity and freshness metadata for a remote content artifact
///
/// Never mutated locally; only refreshed by re-querying the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFileHandle {
    /// Backend-specific identifier (drive file id, or repo path)
    pub id: String,
    /// Display name of the artifact
    pub name: String,
    /// Last modification time in epoch milliseconds
    pub modified_at: u64,
    /// Size in bytes, when the backend reports it
    pub size: Option<u64>,
}

/// Uniform interface over a content-hosting backend
#[async_trait]
pub trait RemoteStore: Send + Sync + std::fmt::Debug {
    /// Fetch metadata for a file by id; `Ok(None)` when it does not exist
    async fn metadata(&self, file_id: &str) -> SyncResult<Option<RemoteFileHandle>>;

    /// Find files by display name, sorted most-recent-first
    async fn search_by_name(&self, name: &str) -> SyncResult<Vec<RemoteFileHandle>>;

    /// Download the file body as a string
    ///
    /// Fails on non-2xx or transport errors; never retries internally.
    async fn download(&self, file_id: &str) -> SyncResult<String>;

    /// Replace the file in place, or create it when `file_id` is absent or
    /// no longer resolves
    async fn upload(
        &self,
        file_id: Option<&str>,
        name: &str,
        body: &str,
        description: &str,
    ) -> SyncResult<RemoteFileHandle>;
}

/// Build the backend selected by configuration
///
/// The bearer token comes from an external auth collaborator; this layer
/// only consumes it.
pub fn backend_from_config(config: &Config) -> SyncResult<Arc<dyn RemoteStore>> {
    let token = config.token.clone().ok_or_else(|| SyncError::Auth {
        reason: "no bearer token configured (set PAGESYNC_TOKEN)".to_string(),
    })?;

    match config.backend {
        Backend::Drive => Ok(Arc::new(DriveStore::new(token))),
        Backend::Github => {
            let owner = config.github_owner.clone().ok_or_else(|| SyncError::Validation {
                reason: "github backend selected but github_owner is not set".to_string(),
            })?;
            let repo = config.github_repo.clone().ok_or_else(|| SyncError::Validation {
                reason: "github backend selected but github_repo is not set".to_string(),
            })?;
            Ok(Arc::new(GithubStore::new(
                token,
                owner,
                repo,
                config.github_path.clone(),
                config.github_branch.clone(),
            )))
        }
    }
}

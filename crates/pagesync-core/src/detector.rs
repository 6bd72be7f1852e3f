//! Remote change detection
//!
//! Compares the remote artifact's modification timestamp against the last
//! applied baseline. Strict greater-than: an equal timestamp never triggers
//! a resync, and a baseline of 0 treats any existing remote file as stale.

use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::remote::{RemoteFileHandle, RemoteStore};

/// Locate the remote content artifact
///
/// Prefers metadata by id; a permission failure on the id lookup falls back
/// to a name search (most recent match wins). `Ok(None)` when no artifact
/// exists anywhere.
pub async fn find_remote(
    remote: &dyn RemoteStore,
    file_id: Option<&str>,
    file_name: &str,
) -> SyncResult<Option<RemoteFileHandle>> {
    if let Some(id) = file_id {
        match remote.metadata(id).await {
            Ok(Some(handle)) => return Ok(Some(handle)),
            Ok(None) => {}
            Err(SyncError::Auth { reason }) => {
                // Some backends deny per-file metadata but still allow
                // listing; fall back to the name search before giving up.
                warn!("Metadata lookup denied ({}), falling back to name search", reason);
            }
            Err(e) => return Err(e),
        }
    }

    let mut matches = remote.search_by_name(file_name).await?;
    if matches.is_empty() {
        return Ok(None);
    }
    Ok(Some(matches.remove(0)))
}

/// Check whether the remote artifact is newer than the applied baseline
///
/// Returns the handle to sync from when an update is warranted, `Ok(None)`
/// when there is nothing to do. A missing remote artifact is "nothing to
/// do", not an error.
pub async fn has_remote_update(
    remote: &dyn RemoteStore,
    file_id: Option<&str>,
    file_name: &str,
    baseline: u64,
) -> SyncResult<Option<RemoteFileHandle>> {
    let Some(handle) = find_remote(remote, file_id, file_name).await? else {
        debug!("No remote content artifact found");
        return Ok(None);
    };

    if handle.modified_at > baseline {
        debug!(
            "Remote update detected: {} > baseline {}",
            handle.modified_at, baseline
        );
        Ok(Some(handle))
    } else {
        debug!(
            "Remote unchanged: {} <= baseline {}",
            handle.modified_at, baseline
        );
        Ok(None)
    }
}

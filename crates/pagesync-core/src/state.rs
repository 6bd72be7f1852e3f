//! Reconciler state and counters
//!
//! [`SyncState`] is owned exclusively by the reconciler and persisted after
//! every mutation so counters survive a restart. The armed-timer flag never
//! survives: a fresh process always starts stopped.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Current epoch milliseconds
pub fn epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Observable reconciler state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// Whether the periodic timer is armed
    #[serde(default)]
    pub is_running: bool,
    /// When the last check-then-sync cycle started (epoch ms)
    #[serde(default)]
    pub last_check: Option<u64>,
    /// When a sync last applied a document (epoch ms)
    #[serde(default)]
    pub last_sync: Option<u64>,
    /// Message of the most recent failure, cleared on success
    #[serde(default)]
    pub last_error: Option<String>,
    /// When the next timer tick is due; None unless running
    #[serde(default)]
    pub next_check: Option<u64>,
    #[serde(default)]
    pub checks_performed: u64,
    #[serde(default)]
    pub successful_syncs: u64,
    #[serde(default)]
    pub failed_syncs: u64,
}

impl SyncState {
    /// Record the start of a cycle
    pub fn begin_check(&mut self, now: u64, next_check: Option<u64>) {
        self.last_check = Some(now);
        self.checks_performed += 1;
        self.next_check = next_check;
    }

    /// Record a successful sync
    pub fn record_success(&mut self, now: u64) {
        self.last_sync = Some(now);
        self.successful_syncs += 1;
        self.last_error = None;
    }

    /// Record a failed sync
    pub fn record_failure(&mut self, message: String) {
        self.failed_syncs += 1;
        self.last_error = Some(message);
    }
}

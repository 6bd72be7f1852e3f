//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use chrono::{DateTime, Utc};
use pagesync_core::{RemoteFileHandle, SyncEvent, SyncEventKind, SyncState};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

/// Format an epoch-milliseconds timestamp for humans
fn format_ms(ms: u64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ms.to_string())
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print an informational message (suppressed in quiet and JSON modes)
    pub fn message(&self, msg: &str) {
        if self.format == OutputFormat::Human {
            println!("{}", msg);
        }
    }

    /// Print a success message
    pub fn success(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({ "success": true, "message": msg }))
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print the reconciler state
    pub fn print_state(&self, state: &SyncState) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(state).unwrap_or_default());
            }
            OutputFormat::Quiet => {
                println!("{}", if state.is_running { "running" } else { "stopped" });
            }
            OutputFormat::Human => {
                println!("Sync:");
                println!(
                    "  Timer:       {}",
                    if state.is_running { "running" } else { "stopped" }
                );
                if let Some(ms) = state.last_check {
                    println!("  Last check:  {}", format_ms(ms));
                }
                if let Some(ms) = state.last_sync {
                    println!("  Last sync:   {}", format_ms(ms));
                }
                if let Some(ms) = state.next_check {
                    println!("  Next check:  {}", format_ms(ms));
                }
                println!("  Checks:      {}", state.checks_performed);
                println!("  Successes:   {}", state.successful_syncs);
                println!("  Failures:    {}", state.failed_syncs);
                if let Some(ref err) = state.last_error {
                    println!("  Last error:  {}", err);
                }
            }
        }
    }

    /// Print a remote file handle
    pub fn print_handle(&self, handle: &RemoteFileHandle) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(handle).unwrap_or_default());
            }
            OutputFormat::Quiet => println!("{}", handle.id),
            OutputFormat::Human => {
                println!("Remote file:");
                println!("  ID:       {}", handle.id);
                println!("  Name:     {}", handle.name);
                println!("  Modified: {}", format_ms(handle.modified_at));
                if let Some(size) = handle.size {
                    println!("  Size:     {} bytes", size);
                }
            }
        }
    }

    /// Print a live sync event
    pub fn print_event(&self, event: &SyncEvent) {
        match self.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(event).unwrap_or_default());
            }
            OutputFormat::Quiet => {}
            OutputFormat::Human => {
                let label = match event.kind {
                    SyncEventKind::Checking => "checking",
                    SyncEventKind::Syncing => "syncing",
                    SyncEventKind::Success => "success",
                    SyncEventKind::Error => "error",
                    SyncEventKind::NoUpdates => "no-updates",
                    SyncEventKind::Started => "started",
                    SyncEventKind::Stopped => "stopped",
                };
                println!("[{}] {:<10} {}", format_ms(event.timestamp), label, event.message);
            }
        }
    }
}

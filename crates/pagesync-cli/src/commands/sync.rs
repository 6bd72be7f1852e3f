//! Sync and check command handlers

use anyhow::Result;

use crate::output::Output;
use crate::App;

/// Run the download-and-apply portion of a cycle once, right now
pub async fn sync(app: &App, output: &Output) -> Result<()> {
    let reconciler = app.reconciler()?;

    output.message("Syncing content from remote...");
    let applied = reconciler.trigger_manual_sync().await?;

    if applied {
        output.success("Content updated from remote");
    } else {
        output.success("Already up to date");
    }
    Ok(())
}

/// Run a full check-then-sync cycle, outside the timer cadence
pub async fn check(app: &App, output: &Output) -> Result<()> {
    let reconciler = app.reconciler()?;

    output.message("Checking for remote content updates...");
    let applied = reconciler.force_check().await?;

    if applied {
        output.success("Update found and applied");
    } else {
        output.success("No updates");
    }
    output.print_state(&reconciler.state());
    Ok(())
}

//! Watch command handler
//!
//! Runs the reconciler in the foreground, streaming its events until
//! interrupted.

use anyhow::{Context, Result};

use crate::output::Output;
use crate::App;

/// Arm the auto-sync timer and stream events until Ctrl-C
pub async fn watch(app: &App, output: &Output) -> Result<()> {
    let reconciler = app.reconciler()?;
    let mut events = reconciler
        .take_events()
        .context("Event stream already consumed")?;

    output.message(&format!(
        "Watching for content updates every {}s (Ctrl-C to stop)",
        app.config.check_interval_secs
    ));
    reconciler.start();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break;
            }
            event = events.recv() => {
                match event {
                    Some(event) => output.print_event(&event),
                    None => break,
                }
            }
        }
    }

    reconciler.stop();
    // Drain the Stopped event so the final state is visible
    while let Ok(event) = events.try_recv() {
        output.print_event(&event);
    }
    output.message("Stopped.");
    Ok(())
}

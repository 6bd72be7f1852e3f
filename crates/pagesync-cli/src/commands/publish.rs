//! Publish command handler

use anyhow::{Context, Result};
use chrono::Utc;
use pagesync_core::{envelope, Backend, UpdateMessage};

use crate::output::Output;
use crate::App;

/// Upload the locally applied content document to the remote backend
pub async fn publish(app: &App, output: &Output) -> Result<()> {
    let remote = app.remote()?;
    let document = app.content.get();
    document
        .validate()
        .context("Local content failed validation; refusing to publish")?;

    let body = envelope::encode_json(&document)?;
    let description = format!("pagesync publish {}", Utc::now().format("%Y-%m-%d %H:%M UTC"));

    output.message("Uploading content to remote...");
    let handle = remote
        .upload(
            app.config.drive_file_id.as_deref(),
            &app.config.drive_file_name,
            &body,
            &description,
        )
        .await?;

    // Remember a freshly created drive file id for future syncs
    if app.config.backend == Backend::Drive
        && app.config.drive_file_id.as_deref() != Some(handle.id.as_str())
    {
        let mut config = app.config.clone();
        config.drive_file_id = Some(handle.id.clone());
        config.save()?;
        output.message(&format!("Recorded new remote file id {}", handle.id));
    }

    // The published artifact is now the baseline; don't re-sync our own upload
    if handle.modified_at > 0 {
        app.local.set_baseline(handle.modified_at)?;
    }
    app.broadcaster
        .publish(&UpdateMessage::published(document, handle.id.clone()));

    output.success("Content published");
    output.print_handle(&handle);
    Ok(())
}

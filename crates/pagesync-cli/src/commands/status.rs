//! Status command handler

use anyhow::Result;
use pagesync_core::Backend;

use crate::output::{Output, OutputFormat};
use crate::App;

/// Show configuration and sync status
pub fn show(app: &App, output: &Output) -> Result<()> {
    let state = app.local.load_sync_state()?;
    let baseline = app.local.baseline()?;
    let config = &app.config;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": match config.backend {
                        Backend::Drive => "drive",
                        Backend::Github => "github",
                    },
                    "auto_sync_enabled": config.auto_sync_enabled,
                    "check_interval_secs": config.check_interval_secs,
                    "data_dir": config.data_dir,
                    "baseline": baseline,
                    "sync": state,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", baseline);
        }
        OutputFormat::Human => {
            println!("pagesync Status");
            println!("===============");
            println!();
            println!("Backend:");
            match config.backend {
                Backend::Drive => {
                    println!("  Type: drive");
                    println!(
                        "  File: {} ({})",
                        config.drive_file_name,
                        config.drive_file_id.as_deref().unwrap_or("id unknown")
                    );
                }
                Backend::Github => {
                    println!("  Type: github");
                    println!(
                        "  Repo: {}/{} @ {}",
                        config.github_owner.as_deref().unwrap_or("?"),
                        config.github_repo.as_deref().unwrap_or("?"),
                        config.github_branch
                    );
                    println!("  Path: {}", config.github_path);
                }
            }
            println!(
                "  Auto-sync: {} (every {}s)",
                if config.auto_sync_enabled {
                    "enabled"
                } else {
                    "disabled"
                },
                config.check_interval_secs
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Baseline: {}", baseline);
            println!();
            output.print_state(&state);
        }
    }

    Ok(())
}

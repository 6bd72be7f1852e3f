//! Config command handlers

use anyhow::{bail, Context, Result};

use pagesync_core::{Backend, Config};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config: &Config, output: &Output) -> Result<()> {
    match output.format {
        OutputFormat::Json => {
            // Never print the token itself
            let mut masked = config.clone();
            masked.token = masked.token.map(|_| "***".to_string());
            println!(
                "{}",
                serde_json::to_string_pretty(&masked).context("Failed to serialize config")?
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:            {}", config.data_dir.display());
            println!(
                "  backend:             {}",
                match config.backend {
                    Backend::Drive => "drive",
                    Backend::Github => "github",
                }
            );
            println!(
                "  drive_file_id:       {}",
                config.drive_file_id.as_deref().unwrap_or("(not set)")
            );
            println!("  drive_file_name:     {}", config.drive_file_name);
            println!(
                "  github_owner:        {}",
                config.github_owner.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  github_repo:         {}",
                config.github_repo.as_deref().unwrap_or("(not set)")
            );
            println!("  github_path:         {}", config.github_path);
            println!("  github_branch:       {}", config.github_branch);
            println!("  auto_sync_enabled:   {}", config.auto_sync_enabled);
            println!("  check_interval_secs: {}", config.check_interval_secs);
            println!("  max_retries:         {}", config.max_retries);
            println!("  retry_delay_secs:    {}", config.retry_delay_secs);
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    fn optional(value: &str) -> Option<String> {
        if value.is_empty() || value == "none" {
            None
        } else {
            Some(value.to_string())
        }
    }

    match key.as_str() {
        "data_dir" => config.data_dir = value.clone().into(),
        "backend" => {
            config.backend = match value.as_str() {
                "drive" => Backend::Drive,
                "github" => Backend::Github,
                _ => bail!("Invalid backend '{}'. Use 'drive' or 'github'.", value),
            };
        }
        "token" => config.token = optional(&value),
        "drive_file_id" => config.drive_file_id = optional(&value),
        "drive_file_name" => config.drive_file_name = value.clone(),
        "github_owner" => config.github_owner = optional(&value),
        "github_repo" => config.github_repo = optional(&value),
        "github_path" => config.github_path = value.clone(),
        "github_branch" => config.github_branch = value.clone(),
        "auto_sync_enabled" => {
            config.auto_sync_enabled = value
                .parse()
                .context("Invalid value for auto_sync_enabled. Use 'true' or 'false'.")?;
        }
        "check_interval_secs" => {
            config.check_interval_secs = value
                .parse()
                .context("Invalid value for check_interval_secs. Use a number of seconds.")?;
        }
        "max_retries" => {
            config.max_retries = value
                .parse()
                .context("Invalid value for max_retries. Use a number of attempts.")?;
        }
        "retry_delay_secs" => {
            config.retry_delay_secs = value
                .parse()
                .context("Invalid value for retry_delay_secs. Use a number of seconds.")?;
        }
        _ => {
            bail!(
                "Unknown configuration key: '{}'\n\
                 Valid keys: data_dir, backend, token, drive_file_id, drive_file_name, \
                 github_owner, github_repo, github_path, github_branch, \
                 auto_sync_enabled, check_interval_secs, max_retries, retry_delay_secs",
                key
            );
        }
    }

    config.save().context("Failed to save configuration")?;
    let shown = if key == "token" { "***" } else { value.as_str() };
    output.success(&format!("Set {} = {}", key, shown));

    Ok(())
}

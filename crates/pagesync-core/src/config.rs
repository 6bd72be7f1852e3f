//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/pagesync/config.toml)
//! 3. Environment variables (PAGESYNC_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable prefix
const ENV_PREFIX: &str = "PAGESYNC";

/// Which remote content backend to talk to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cloud-drive JSON blob
    Drive,
    /// Source-control contents API
    Github,
}

impl Default for Backend {
    fn default() -> Self {
        Backend::Drive
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for durable local storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Remote backend selection
    #[serde(default)]
    pub backend: Backend,

    /// Bearer token for the remote backend (usually set via PAGESYNC_TOKEN)
    #[serde(default)]
    pub token: Option<String>,

    /// Known id of the remote content file, if any
    #[serde(default)]
    pub drive_file_id: Option<String>,

    /// Display name of the content file, used for name-based lookup
    #[serde(default = "default_file_name")]
    pub drive_file_name: String,

    /// GitHub repository owner (github backend)
    #[serde(default)]
    pub github_owner: Option<String>,

    /// GitHub repository name (github backend)
    #[serde(default)]
    pub github_repo: Option<String>,

    /// Path of the content file inside the repository
    #[serde(default = "default_github_path")]
    pub github_path: String,

    /// Branch to read and write (github backend)
    #[serde(default = "default_branch")]
    pub github_branch: String,

    /// Whether the auto-sync timer should be armed
    #[serde(default)]
    pub auto_sync_enabled: bool,

    /// Seconds between timer-driven checks
    #[serde(default = "default_interval")]
    pub check_interval_secs: u64,

    /// Total attempts per failing operation (not retries after the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to sleep between attempts
    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::Drive,
            token: None,
            drive_file_id: None,
            drive_file_name: default_file_name(),
            github_owner: None,
            github_repo: None,
            github_path: default_github_path(),
            github_branch: default_branch(),
            auto_sync_enabled: false,
            check_interval_secs: default_interval(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (PAGESYNC_DATA_DIR, PAGESYNC_TOKEN, ...)
    /// 2. Config file (~/.config/pagesync/config.toml or PAGESYNC_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_TOKEN", ENV_PREFIX)) {
            self.token = if val.is_empty() { None } else { Some(val) };
        }

        if let Ok(val) = std::env::var(format!("{}_AUTO_SYNC", ENV_PREFIX)) {
            self.auto_sync_enabled = val.eq_ignore_ascii_case("true") || val == "1";
        }

        if let Ok(val) = std::env::var(format!("{}_INTERVAL_SECS", ENV_PREFIX)) {
            if let Ok(secs) = val.parse() {
                self.check_interval_secs = secs;
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with PAGESYNC_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("pagesync")
            .join("config.toml")
    }

    /// Interval between timer-driven checks
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Sleep between failing attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pagesync")
}

fn default_file_name() -> String {
    "site-content.json".to_string()
}

fn default_github_path() -> String {
    "content/site-content.json".to_string()
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_interval() -> u64 {
    300
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap();
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            // Clear all the vars
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "PAGESYNC_DATA_DIR",
        "PAGESYNC_TOKEN",
        "PAGESYNC_AUTO_SYNC",
        "PAGESYNC_INTERVAL_SECS",
    ];

    #[test]
    fn test_default_config() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::default();
        assert!(!config.auto_sync_enabled);
        assert!(config.token.is_none());
        assert_eq!(config.backend, Backend::Drive);
        assert_eq!(config.check_interval_secs, 300);
        assert_eq!(config.max_retries, 3);
        assert!(config.data_dir.ends_with("pagesync"));
    }

    #[test]
    fn test_env_override_token() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("PAGESYNC_TOKEN", "ya29.secret");
        config.apply_env_overrides();
        assert_eq!(config.token.as_deref(), Some("ya29.secret"));

        // Empty string clears it
        env::set_var("PAGESYNC_TOKEN", "");
        config.apply_env_overrides();
        assert!(config.token.is_none());
    }

    #[test]
    fn test_env_override_auto_sync() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("PAGESYNC_AUTO_SYNC", "true");
        config.apply_env_overrides();
        assert!(config.auto_sync_enabled);

        env::set_var("PAGESYNC_AUTO_SYNC", "1");
        config.auto_sync_enabled = false;
        config.apply_env_overrides();
        assert!(config.auto_sync_enabled);

        env::set_var("PAGESYNC_AUTO_SYNC", "false");
        config.apply_env_overrides();
        assert!(!config.auto_sync_enabled);
    }

    #[test]
    fn test_env_override_interval() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("PAGESYNC_INTERVAL_SECS", "30");
        config.apply_env_overrides();
        assert_eq!(config.check_interval(), Duration::from_secs(30));

        // Unparseable values are ignored
        env::set_var("PAGESYNC_INTERVAL_SECS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.check_interval_secs, 30);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            backend = "github"
            github_owner = "acme"
            github_repo = "acme-site"
            auto_sync_enabled = true
            check_interval_secs = 120
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.backend, Backend::Github);
        assert_eq!(config.github_owner.as_deref(), Some("acme"));
        assert_eq!(config.github_branch, "main");
        assert!(config.auto_sync_enabled);
        assert_eq!(config.check_interval_secs, 120);
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        // Should return defaults when file doesn't exist
        assert!(!config.auto_sync_enabled);
        assert_eq!(config.drive_file_name, "site-content.json");
    }

    #[test]
    fn test_serialization_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            backend: Backend::Github,
            drive_file_id: Some("abc123".to_string()),
            auto_sync_enabled: true,
            ..Config::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.backend, Backend::Github);
        assert_eq!(parsed.drive_file_id, config.drive_file_id);
        assert!(parsed.auto_sync_enabled);
    }
}

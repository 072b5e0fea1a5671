//! Service configuration management.
//!
//! Configuration is stored as TOML:
//! - Linux: `~/.config/xhair/xhaird.toml`
//! - Windows: `%APPDATA%/xhair/xhaird.toml`
//!
//! `FACEIT_API_KEY` and `XHAIR_PORT` environment variables override
//! the file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// FACEIT Data API key (Bearer credential).
    #[serde(default)]
    pub faceit_api_key: String,

    /// Base URL of the FACEIT Data API. Empty = production.
    #[serde(default)]
    pub api_base_url: String,

    /// Timeout in seconds for demo downloads.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_port() -> u16 {
    3500
}

fn default_download_timeout() -> u64 {
    120
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            faceit_api_key: String::new(),
            api_base_url: String::new(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

impl Config {
    /// Loads configuration from disk, or creates a default if not
    /// found, then applies environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let path = config_path()?;

        let mut config = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save()?;
            config
        };

        config.apply_env();
        Ok(config)
    }

    /// Applies environment variable overrides.
    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("FACEIT_API_KEY") {
            if !key.is_empty() {
                self.faceit_api_key = key;
            }
        }
        if let Ok(port) = std::env::var("XHAIR_PORT") {
            if let Ok(port) = port.parse() {
                self.port = port;
            }
        }
    }

    /// Saves the current configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = config_path()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;

        // The file holds the API credential; restrict permissions on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }
}

/// Returns the platform-specific configuration file path.
fn config_path() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home)
            .join(".config")
            .join("xhair")
            .join("xhaird.toml"))
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata).join("xhair").join("xhaird.toml"))
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        Ok(PathBuf::from("/tmp/xhair/xhaird.toml"))
    }
}

//! Configuration for things-mcp
//!
//! Config is searched in order:
//! 1. explicit path (`--config` / `THINGS_MCP_CONFIG`)
//! 2. `~/.things-bridge/config.toml`
//! 3. `./things-mcp.toml`
//! 4. `$XDG_CONFIG_HOME/things-mcp/config.toml`
//! 5. Default config if none found

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::script::DEFAULT_APP_NAME;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Automation runner invoked as `<program> -e <script>`
    #[serde(default = "default_program")]
    pub program: String,

    /// Application name addressed by generated scripts
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Seconds before a script is abandoned
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_program() -> String {
    "osascript".to_string()
}

fn default_app_name() -> String {
    DEFAULT_APP_NAME.to_string()
}

fn default_timeout() -> u64 {
    30
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            app_name: default_app_name(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Persist create-family idempotency entries across restarts
    #[serde(default = "default_durable")]
    pub durable: bool,

    /// SQLite file for the durable cache (`~` is expanded)
    #[serde(default)]
    pub path: Option<String>,

    /// Seconds area, project and tag listings are reused
    #[serde(default = "default_listing_ttl")]
    pub listing_ttl_secs: u64,
}

fn default_durable() -> bool {
    true
}

fn default_listing_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            durable: default_durable(),
            path: None,
            listing_ttl_secs: default_listing_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn listing_ttl(&self) -> Duration {
        Duration::from_secs(self.listing_ttl_secs)
    }

    /// Resolved location of the durable cache file
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => expand_home(path),
            None => data_dir().join("bulk_cache.db"),
        }
    }
}

/// `~/.things-bridge`
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".things-bridge")
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

impl Config {
    /// Load config from an explicit path or the standard locations
    pub fn load(explicit: Option<&Path>) -> Config {
        if let Some(path) = explicit {
            if path.exists() {
                if let Some(config) = Self::read(path) {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
            } else {
                tracing::warn!("Config file {} does not exist", path.display());
            }
        }

        let mut config_paths = vec![data_dir().join("config.toml")];
        config_paths.push(PathBuf::from("things-mcp.toml"));
        if let Some(config_dir) = dirs::config_dir() {
            config_paths.push(config_dir.join("things-mcp").join("config.toml"));
        }

        for path in config_paths {
            if path.exists() {
                if let Some(config) = Self::read(&path) {
                    tracing::info!("Loaded config from {}", path.display());
                    return config;
                }
            }
        }

        tracing::info!("Using default configuration");
        Config::default()
    }

    fn read(path: &Path) -> Option<Config> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read config {}: {}", path.display(), e);
                return None;
            }
        };
        match toml::from_str::<Config>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("Failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.executor.program, "osascript");
        assert_eq!(config.executor.app_name, "Things3");
        assert_eq!(config.executor.timeout_secs, 30);
        assert!(config.cache.durable);
        assert_eq!(config.cache.listing_ttl(), Duration::from_secs(300));
        assert!(config.cache.resolved_path().ends_with(".things-bridge/bulk_cache.db"));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: Config = toml::from_str(
            r#"
            [executor]
            timeout_secs = 5

            [cache]
            durable = false
            path = "/tmp/things.db"
            listing_ttl_secs = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.executor.timeout_secs, 5);
        assert_eq!(config.executor.program, "osascript");
        assert!(!config.cache.durable);
        assert_eq!(config.cache.resolved_path(), PathBuf::from("/tmp/things.db"));
        assert_eq!(config.cache.listing_ttl_secs, 60);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("things.toml");
        std::fs::write(&path, "[executor]\napp_name = \"Things3 Beta\"\n").unwrap();

        let config = Config::load(Some(&path));
        assert_eq!(config.executor.app_name, "Things3 Beta");
    }
}

//! Library and CLI configuration.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use super::args::CliArgs;
use crate::infrastructure::image::{DEFAULT_MAX_CACHE_SIZE, default_cache_dir, default_max_size};

const APP_NAME: &str = "lumen";
const APP_QUALIFIER: &str = "com";
const APP_ORGANIZATION: &str = "lumen";

/// Log level configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level.
    Trace,
    /// Debug level.
    Debug,
    /// Info level.
    #[default]
    Info,
    /// Warning level.
    Warn,
    /// Error level.
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trace => write!(f, "trace"),
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Configuration for a [`Lumen`](crate::application::Lumen) instance and the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LumenConfig {
    /// Configuration file path.
    #[serde(skip)]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Cache sizing and placement.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Remote fetch settings.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Cache configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Memory cache capacity in bytes. Defaults to an eighth of system memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_size: Option<u64>,

    /// Disk cache budget in bytes.
    #[serde(default = "default_disk_size")]
    pub disk_size: u64,

    /// Disk cache directory. Defaults to the platform cache directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            memory_size: None,
            disk_size: default_disk_size(),
            disk_dir: None,
        }
    }
}

/// HTTP fetcher configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

const fn default_disk_size() -> u64 {
    DEFAULT_MAX_CACHE_SIZE
}

const fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("{APP_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

impl LumenConfig {
    /// Merges CLI arguments into the configuration.
    pub fn merge_with_args(&mut self, args: &CliArgs) {
        if let Some(config_path) = &args.config {
            self.config = Some(config_path.clone());
        }
        if let Some(log_path) = &args.log_path {
            self.log_path = Some(log_path.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(memory_size) = args.memory_cache_size {
            self.cache.memory_size = Some(memory_size);
        }
        if let Some(disk_size) = args.disk_cache_size {
            self.cache.disk_size = disk_size;
        }
        if let Some(disk_dir) = &args.disk_cache_dir {
            self.cache.disk_dir = Some(disk_dir.clone());
        }
        if let Some(timeout) = args.http_timeout {
            self.http.timeout_secs = timeout;
        }
    }

    /// Returns default config directory.
    #[must_use]
    pub fn default_config_dir() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Returns default config file path.
    #[must_use]
    pub fn default_config_path() -> Option<PathBuf> {
        Self::default_config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Returns default log file path.
    #[must_use]
    pub fn default_log_path() -> Option<PathBuf> {
        ProjectDirs::from(APP_QUALIFIER, APP_ORGANIZATION, APP_NAME)
            .map(|dirs| dirs.data_dir().join("lumen.log"))
    }

    /// Returns effective config path.
    #[must_use]
    pub fn effective_config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Self::default_config_path)
    }

    /// Returns effective log path.
    #[must_use]
    pub fn effective_log_path(&self) -> Option<PathBuf> {
        self.log_path.clone().or_else(Self::default_log_path)
    }

    /// Returns the memory cache capacity, detecting system memory when unset.
    #[must_use]
    pub fn effective_memory_cache_size(&self) -> u64 {
        self.cache.memory_size.unwrap_or_else(default_max_size)
    }

    /// Returns the disk cache directory.
    #[must_use]
    pub fn effective_disk_cache_dir(&self) -> PathBuf {
        self.cache.disk_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Returns the HTTP request timeout.
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }
}

impl Default for LumenConfig {
    fn default() -> Self {
        Self {
            config: None,
            log_path: None,
            log_level: LogLevel::Info,
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
            log_level = "debug"

            [cache]
            memory_size = 1048576
            disk_dir = "/var/cache/lumen"

            [http]
            user_agent = "gallery/2.1"
        "#;

        let config: LumenConfig = toml::from_str(toml_content).expect("Failed to parse config");

        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.effective_memory_cache_size(), 1_048_576);
        assert_eq!(config.cache.disk_size, DEFAULT_MAX_CACHE_SIZE);
        assert_eq!(
            config.effective_disk_cache_dir(),
            PathBuf::from("/var/cache/lumen")
        );
        assert_eq!(config.http.user_agent, "gallery/2.1");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_default_config() {
        let config = LumenConfig::default();

        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.cache.disk_size, 50 * 1024 * 1024);
        assert!(config.cache.memory_size.is_none());
        assert!(config.effective_memory_cache_size() > 0);
        assert!(config.http.user_agent.starts_with("lumen/"));
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let rendered = toml::to_string_pretty(&LumenConfig::default()).unwrap();
        let parsed: LumenConfig = toml::from_str(&rendered).unwrap();

        assert_eq!(parsed.cache.disk_size, DEFAULT_MAX_CACHE_SIZE);
        assert_eq!(parsed.http.timeout_secs, 30);
    }

    #[test]
    fn test_cli_args_override_file_values() {
        let mut config = LumenConfig::default();
        let args = CliArgs::parse_from([
            "lumen",
            "--log-level",
            "trace",
            "--disk-cache-size",
            "1024",
            "--http-timeout",
            "5",
            "info",
        ]);

        config.merge_with_args(&args);

        assert_eq!(config.log_level, LogLevel::Trace);
        assert_eq!(config.cache.disk_size, 1024);
        assert_eq!(config.http_timeout(), Duration::from_secs(5));
        assert!(config.cache.memory_size.is_none());
    }
}

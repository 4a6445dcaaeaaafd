//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::client::HttpMethod;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub datasource: DatasourceConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// openGemini connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatasourceConfig {
    /// Base URL of the HTTP API
    #[serde(default = "default_url")]
    pub url: String,

    /// Default database sent as `db`
    #[serde(default)]
    pub database: String,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub http_method: HttpMethod,

    /// Lower bound for `$__interval`
    #[serde(default = "default_min_time_interval")]
    pub min_time_interval: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_min_time_interval() -> String {
    "10s".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            database: String::new(),
            user: String::new(),
            password: String::new(),
            http_method: HttpMethod::default(),
            min_time_interval: default_min_time_interval(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("gemini-query").join("config.toml")),
            Some(PathBuf::from("/etc/gemini-query/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("GEMINI_URL") {
            self.datasource.url = url;
        }
        if let Ok(database) = std::env::var("GEMINI_DATABASE") {
            self.datasource.database = database;
        }
        if let Ok(user) = std::env::var("GEMINI_USER") {
            self.datasource.user = user;
        }
        if let Ok(password) = std::env::var("GEMINI_PASSWORD") {
            self.datasource.password = password;
        }
        if let Ok(method) = std::env::var("GEMINI_HTTP_METHOD") {
            match HttpMethod::from_str(&method) {
                Some(m) => self.datasource.http_method = m,
                None => tracing::warn!("Ignoring unknown GEMINI_HTTP_METHOD: {}", method),
            }
        }

        if let Ok(level) = std::env::var("GEMINI_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("GEMINI_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# gemini-query configuration
#
# Environment variables override these settings:
# - GEMINI_URL
# - GEMINI_DATABASE
# - GEMINI_USER
# - GEMINI_PASSWORD
# - GEMINI_HTTP_METHOD
# - GEMINI_LOG_LEVEL
# - GEMINI_LOG_FORMAT

[datasource]
# openGemini HTTP endpoint
url = "http://localhost:8086"

# Database sent with every query
database = ""

# Credentials (leave empty to send none)
user = ""
password = ""

# HTTP method for /query: get or post
http_method = "post"

# Lower bound for $__interval
min_time_interval = "10s"

# Request timeout in milliseconds
request_timeout_ms = 30000

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.datasource.url, "http://localhost:8086");
        assert_eq!(config.datasource.http_method, HttpMethod::Post);
        assert_eq!(config.datasource.min_time_interval, "10s");
        assert_eq!(config.datasource.request_timeout_ms, 30_000);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_generated_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.datasource.url, "http://localhost:8086");
        assert_eq!(config.datasource.http_method, HttpMethod::Post);
        assert!(config.datasource.database.is_empty());
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[datasource]\nurl = \"http://gemini:8086\"\ndatabase = \"monitor\"\nhttp_method = \"get\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.datasource.url, "http://gemini:8086");
        assert_eq!(config.datasource.database, "monitor");
        assert_eq!(config.datasource.http_method, HttpMethod::Get);
        assert_eq!(config.datasource.request_timeout_ms, 30_000);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(matches!(Config::load(&missing), Err(ConfigError::Io { .. })));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[datasource\nurl = ").unwrap();
        assert!(matches!(Config::load(&bad), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("GEMINI_DATABASE", "from_env");
        std::env::set_var("GEMINI_HTTP_METHOD", "GET");
        let config = Config::from_env();
        std::env::remove_var("GEMINI_DATABASE");
        std::env::remove_var("GEMINI_HTTP_METHOD");

        assert_eq!(config.datasource.database, "from_env");
        assert_eq!(config.datasource.http_method, HttpMethod::Get);
    }
}

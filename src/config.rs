//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::push::PushConfig;
use crate::store::RestStoreConfig;
use crate::websocket::CALL_SOUND;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub push: PushSettings,

    #[serde(default)]
    pub notifications: NotificationsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted database and identity service
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Public (anon) key sent with every request
    #[serde(default)]
    pub api_key: String,

    /// Privileged key for server-side writes such as contact submissions
    #[serde(default)]
    pub service_key: Option<String>,

    #[serde(default = "default_store_timeout")]
    pub request_timeout_ms: u64,
}

fn default_store_url() -> String {
    "http://localhost:54321".to_string()
}

fn default_store_timeout() -> u64 {
    10_000
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            api_key: String::new(),
            service_key: None,
            request_timeout_ms: default_store_timeout(),
        }
    }
}

impl StoreConfig {
    pub fn rest_config(&self) -> RestStoreConfig {
        RestStoreConfig {
            url: self.url.trim_end_matches('/').to_string(),
            api_key: self.api_key.clone(),
            access_token: None,
            request_timeout_ms: self.request_timeout_ms,
        }
    }

    /// Same endpoint authenticated with the service key, if one is set
    pub fn service_rest_config(&self) -> Option<RestStoreConfig> {
        self.service_key
            .as_ref()
            .filter(|key| !key.is_empty())
            .map(|key| RestStoreConfig {
                api_key: key.clone(),
                ..self.rest_config()
            })
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8082
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ApiConfig {
    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Push channel from the gateways
#[derive(Debug, Clone, Deserialize)]
pub struct PushSettings {
    /// No push channel is opened when unset
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_reconnect_interval")]
    pub reconnect_interval_secs: u64,

    #[serde(default = "default_reconnect_attempts")]
    pub reconnect_attempts: u32,
}

fn default_reconnect_interval() -> u64 {
    5
}

fn default_reconnect_attempts() -> u32 {
    10
}

impl Default for PushSettings {
    fn default() -> Self {
        Self {
            url: None,
            reconnect_interval_secs: default_reconnect_interval(),
            reconnect_attempts: default_reconnect_attempts(),
        }
    }
}

impl PushSettings {
    pub fn push_config(&self) -> Option<PushConfig> {
        let url = self.url.as_deref().filter(|u| !u.is_empty())?;
        let mut config = PushConfig::new(url);
        config.reconnect_interval = std::time::Duration::from_secs(self.reconnect_interval_secs);
        config.reconnect_attempts = self.reconnect_attempts;
        Some(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Sound clients play for a call
    #[serde(default = "default_sound")]
    pub sound: String,

    /// Ring the terminal bell in the CLI listener
    #[serde(default = "default_bell")]
    pub terminal_bell: bool,
}

fn default_sound() -> String {
    CALL_SOUND.to_string()
}

fn default_bell() -> bool {
    true
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            sound: default_sound(),
            terminal_bell: default_bell(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

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
        for path in Self::search_paths() {
            if path.exists() {
                match Self::load_with_env(&path) {
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

    pub fn search_paths() -> Vec<PathBuf> {
        [
            dirs::config_dir().map(|p| p.join("khachvui").join("config.toml")),
            Some(PathBuf::from("/etc/khachvui/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from `lookup`; the first name listed for a setting wins
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let first = |keys: &[&str]| keys.iter().find_map(|key| lookup(key));

        // Store overrides; the NEXT_PUBLIC_ names match the web frontend's env
        if let Some(url) = first(&["KHACHVUI_STORE_URL", "NEXT_PUBLIC_SUPABASE_URL"]) {
            self.store.url = url;
        }
        if let Some(key) = first(&["KHACHVUI_STORE_KEY", "NEXT_PUBLIC_SUPABASE_ANON_KEY"]) {
            self.store.api_key = key;
        }
        if let Some(key) = first(&["KHACHVUI_SERVICE_KEY"]) {
            self.store.service_key = Some(key);
        }

        // API overrides
        if let Some(host) = first(&["KHACHVUI_API_HOST"]) {
            self.api.host = host;
        }
        if let Some(port) = first(&["KHACHVUI_API_PORT"]) {
            if let Ok(p) = port.parse() {
                self.api.port = p;
            }
        }

        if let Some(url) = first(&["KHACHVUI_PUSH_URL"]) {
            self.push.url = Some(url);
        }

        // Logging overrides
        if let Some(level) = first(&["KHACHVUI_LOG_LEVEL"]) {
            self.logging.level = level;
        }
        if let Some(format) = first(&["KHACHVUI_LOG_FORMAT"]) {
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
    r#"# Khách Vui Configuration
#
# Environment variables override these settings:
# - KHACHVUI_STORE_URL (or NEXT_PUBLIC_SUPABASE_URL)
# - KHACHVUI_STORE_KEY (or NEXT_PUBLIC_SUPABASE_ANON_KEY)
# - KHACHVUI_SERVICE_KEY
# - KHACHVUI_API_HOST
# - KHACHVUI_API_PORT
# - KHACHVUI_PUSH_URL
# - KHACHVUI_LOG_LEVEL
# - KHACHVUI_LOG_FORMAT

[store]
# Base URL of the hosted database (REST under /rest/v1, auth under /auth/v1)
url = "http://localhost:54321"

# Public API key
api_key = ""

# Optional service key for server-side writes
# service_key = ""

# Request timeout (ms)
request_timeout_ms = 10000

[api]
# API server host
host = "0.0.0.0"

# API server port
port = 8082

# Allowed CORS origins
cors_origins = ["http://localhost:3000", "http://127.0.0.1:3000"]

[push]
# Gateway push endpoint; leave unset to run without one
# url = "ws://192.168.1.10:8081"

# Fixed delay between reconnect attempts (seconds)
reconnect_interval_secs = 5

# Retries after a dropped or failed connection before giving up
reconnect_attempts = 10

[notifications]
# Sound clients play when a table calls staff
sound = "/sounds/notification.mp3"

# Ring the terminal bell in `khachvui-cli listen`
terminal_bell = true

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
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config_parses() {
        let config: Config = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.store.request_timeout_ms, 10_000);
        assert_eq!(config.push.reconnect_attempts, 10);
        assert!(config.push.url.is_none());
        assert!(config.push.push_config().is_none());
        assert_eq!(config.notifications.sound, CALL_SOUND);
    }

    #[test]
    fn test_load_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[store]\nurl = \"https://abc.supabase.co/\"\napi_key = \"anon\"\n\n[push]\nurl = \"ws://10.0.0.5:8081\"\nreconnect_interval_secs = 2"
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        let rest = config.store.rest_config();
        assert_eq!(rest.url, "https://abc.supabase.co");
        assert_eq!(rest.api_key, "anon");
        assert!(config.store.service_rest_config().is_none());

        let push = config.push.push_config().unwrap();
        assert_eq!(push.url, "ws://10.0.0.5:8081");
        assert_eq!(push.reconnect_interval, std::time::Duration::from_secs(2));
        assert_eq!(push.reconnect_attempts, 10);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_bad_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[api]\nport = \"not a number\"").unwrap();

        let err = Config::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(Config::load(Path::new("/nonexistent/khachvui.toml")).is_err());
    }

    #[test]
    fn test_overrides_prefer_own_names() {
        let env: HashMap<&str, &str> = [
            ("KHACHVUI_STORE_URL", "https://own.example"),
            ("NEXT_PUBLIC_SUPABASE_URL", "https://frontend.example"),
            ("NEXT_PUBLIC_SUPABASE_ANON_KEY", "anon-from-frontend"),
            ("KHACHVUI_SERVICE_KEY", "service"),
            ("KHACHVUI_API_PORT", "not-a-port"),
            ("KHACHVUI_LOG_FORMAT", "json"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.url, "https://own.example");
        assert_eq!(config.store.api_key, "anon-from-frontend");
        assert_eq!(
            config.store.service_rest_config().unwrap().api_key,
            "service"
        );
        assert_eq!(config.api.port, 8082);
        assert_eq!(config.logging.format, "json");
    }
}

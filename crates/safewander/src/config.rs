//! Configuration management for safewander.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "safewander";

/// Default cache database file name.
const CACHE_FILE_NAME: &str = "cache.db";

/// Default storage bucket for review photos.
pub const DEFAULT_BUCKET: &str = "review-images";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SAFEWANDER_`, sections split on `__`)
/// 2. TOML config file at `~/.config/safewander/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Review backend configuration.
    pub backend: BackendConfig,
    /// Safety-review service configuration.
    pub safety: SafetyConfig,
    /// Retry configuration shared by the remote clients.
    pub retry: RetryConfig,
    /// Object storage configuration.
    pub storage: StorageConfig,
    /// Local cache configuration.
    pub cache: CacheConfig,
    /// Degradation behaviour.
    pub fallback: FallbackConfig,
}

/// Review backend configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the review backend.
    pub url: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Connection timeout in milliseconds.
    pub connect_timeout_ms: u64,
}

/// Safety-review service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyConfig {
    /// Base URL of the safety-review service.
    pub api_url: String,
    /// Per-request timeout in milliseconds.
    /// Generation is slow, so this is longer than the backend's.
    pub timeout_ms: u64,
}

/// Retry configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per request, including the first one.
    pub max_attempts: usize,
    /// Backoff unit; attempt `n` waits `n * base_backoff_ms`.
    pub base_backoff_ms: u64,
}

/// Object storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base URL of the storage service. Uploads are disabled when unset.
    pub url: Option<String>,
    /// Public (anonymous) API key.
    pub anon_key: Option<String>,
    /// Bucket that holds review photos.
    pub bucket: String,
}

/// Local cache configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Keep a local copy of fetched reviews and an outbox of unsent ones.
    pub enabled: bool,
    /// Path to the cache database.
    /// Defaults to `~/.local/share/safewander/cache.db`
    pub database_path: Option<PathBuf>,
    /// Age after which cached reviews are reported as stale.
    pub max_age_hours: u32,
}

/// Degradation behaviour when the backend is unreachable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackConfig {
    /// Show the embedded sample places alongside live ones.
    pub include_samples: bool,
    /// Serve cached reviews when the backend is down.
    pub use_cache: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            timeout_ms: 8_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8000".to_string(),
            timeout_ms: 15_000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 200,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            database_path: None, // Will be resolved to default at runtime
            max_age_hours: 24,
        }
    }
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            include_samples: true,
            use_cache: true,
        }
    }
}

impl BackendConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get the connect timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl SafetyConfig {
    /// Get the request timeout as a Duration.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SAFEWANDER_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_url("safety.api_url", &self.safety.api_url)?;

        if self.backend.timeout_ms == 0 || self.backend.connect_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "backend timeouts must be greater than 0".to_string(),
            });
        }

        if self.safety.timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "safety.timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::ConfigValidation {
                message: "retry.max_attempts must be at least 1".to_string(),
            });
        }

        if let Some(url) = &self.storage.url {
            validate_url("storage.url", url)?;
            if self.storage.anon_key.as_deref().map_or(true, |k| k.trim().is_empty()) {
                return Err(Error::ConfigValidation {
                    message: "storage.anon_key is required when storage.url is set".to_string(),
                });
            }
        }

        if self.storage.bucket.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "storage.bucket must not be empty".to_string(),
            });
        }

        Ok(())
    }

    /// Get the cache database path, resolving defaults if not set.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.cache
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(CACHE_FILE_NAME))
    }

    /// Get the cache staleness threshold as a Duration.
    #[must_use]
    pub fn cache_max_age(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache.max_age_hours) * 60 * 60)
    }

    /// Check whether photo uploads are possible.
    #[must_use]
    pub fn storage_configured(&self) -> bool {
        self.storage.url.is_some() && self.storage.anon_key.is_some()
    }
}

fn validate_url(field: &str, url: &str) -> Result<()> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(Error::ConfigValidation {
            message: format!("{field} must not be empty"),
        });
    }
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(Error::ConfigValidation {
            message: format!("{field} must be an http(s) URL, got {trimmed}"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.backend.url, "http://127.0.0.1:5000");
        assert_eq!(config.safety.api_url, "http://127.0.0.1:8000");
        assert!(config.cache.enabled);
        assert!(config.fallback.include_samples);
        assert!(config.fallback.use_cache);
        assert!(!config.storage_configured());
    }

    #[test]
    fn test_default_retry_config() {
        let retry = RetryConfig::default();

        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.base_backoff_ms, 200);
    }

    #[test]
    fn test_default_storage_config() {
        let storage = StorageConfig::default();

        assert!(storage.url.is_none());
        assert!(storage.anon_key.is_none());
        assert_eq!(storage.bucket, "review-images");
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_backend_url() {
        let mut config = Config::default();
        config.backend.url = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("backend.url"));
    }

    #[test]
    fn test_validate_non_http_url() {
        let mut config = Config::default();
        config.safety.api_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("safety.api_url"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.backend.timeout_ms = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("timeouts"));
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.retry.max_attempts = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("max_attempts"));
    }

    #[test]
    fn test_validate_storage_without_key() {
        let mut config = Config::default();
        config.storage.url = Some("https://storage.example.com".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("anon_key"));

        config.storage.anon_key = Some("public-key".to_string());
        assert!(config.validate().is_ok());
        assert!(config.storage_configured());
    }

    #[test]
    fn test_validate_blank_bucket() {
        let mut config = Config::default();
        config.storage.bucket = String::new();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("bucket"));
    }

    #[test]
    fn test_cache_path_default() {
        let config = Config::default();
        let path = config.cache_path();

        assert!(path.to_string_lossy().contains("cache.db"));
        assert!(path.to_string_lossy().contains("safewander"));
    }

    #[test]
    fn test_cache_path_custom() {
        let mut config = Config::default();
        config.cache.database_path = Some(PathBuf::from("/custom/path/cache.sqlite"));

        assert_eq!(config.cache_path(), PathBuf::from("/custom/path/cache.sqlite"));
    }

    #[test]
    fn test_cache_max_age() {
        let config = Config::default();
        assert_eq!(config.cache_max_age(), Duration::from_secs(24 * 60 * 60));
    }

    #[test]
    fn test_backend_timeouts() {
        let backend = BackendConfig::default();
        assert_eq!(backend.timeout(), Duration::from_millis(8_000));
        assert_eq!(backend.connect_timeout(), Duration::from_millis(3_000));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("safewander"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    // Loading reads `SAFEWANDER_*` from the process environment, so every
    // load test runs inside a `Jail`, which serializes them.

    #[test]
    fn test_load_nonexistent_config() {
        Jail::expect_with(|_| {
            let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config, Config::default());
            Ok(())
        });
    }

    #[test]
    fn test_load_from_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[backend]
url = "https://api.safewander.example"

[retry]
max_attempts = 5

[fallback]
include_samples = false
"#,
            )?;

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.backend.url, "https://api.safewander.example");
            assert_eq!(config.backend.timeout_ms, 8_000);
            assert_eq!(config.retry.max_attempts, 5);
            assert!(!config.fallback.include_samples);
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.toml",
                r#"
[backend]
url = "https://api.safewander.example"
timeout_ms = 5000

[cache]
max_age_hours = 48
"#,
            )?;
            jail.set_env("SAFEWANDER_BACKEND__URL", "http://10.0.0.9:5000");
            jail.set_env("SAFEWANDER_CACHE__MAX_AGE_HOURS", "5");
            jail.set_env("SAFEWANDER_FALLBACK__INCLUDE_SAMPLES", "false");

            let config = Config::load_from(Some(PathBuf::from("config.toml")))
                .map_err(|e| e.to_string())?;
            assert_eq!(config.backend.url, "http://10.0.0.9:5000");
            assert_eq!(config.backend.timeout_ms, 5_000);
            assert_eq!(config.cache.max_age_hours, 5);
            assert_eq!(config.cache_max_age(), Duration::from_secs(5 * 60 * 60));
            assert!(!config.fallback.include_samples);
            assert!(config.fallback.use_cache);
            Ok(())
        });
    }

    #[test]
    fn test_env_values_are_validated() {
        Jail::expect_with(|jail| {
            jail.set_env("SAFEWANDER_RETRY__MAX_ATTEMPTS", "0");

            let result = Config::load_from(Some(PathBuf::from("missing.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_load_invalid_toml_value_fails_validation() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[retry]\nmax_attempts = 0\n")?;

            let result = Config::load_from(Some(PathBuf::from("config.toml")));
            assert!(matches!(result, Err(Error::ConfigValidation { .. })));
            Ok(())
        });
    }

    #[test]
    fn test_config_deserialize_partial() {
        let json = r#"{"backend": {"url": "http://localhost:9000"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.backend.url, "http://localhost:9000");
        assert_eq!(config.backend.timeout_ms, 8_000);
        assert_eq!(config.storage.bucket, DEFAULT_BUCKET);
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("include_samples"));
        assert!(json.contains("review-images"));
    }
}

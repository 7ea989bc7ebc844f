//! Configuration management for the aggregation service.
//!
//! This module handles loading and parsing configuration from TOML files,
//! with sensible defaults for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Upstream provider settings
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log directory path
    pub log_dir: String,

    /// Default log level (trace, debug, info, warn, error)
    pub default_level: String,

    /// Enable console output
    pub console: bool,

    /// Enable file output
    pub file: bool,

    /// Enable JSON formatting for file logs
    pub json_format: bool,
}

/// Upstream GraphQL provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// GraphQL endpoint URL
    pub endpoint: String,

    /// Value sent in the Origin header
    pub origin: String,

    /// Value sent in the User-Agent header
    pub user_agent: String,

    /// Bearer token. Takes precedence over `token_env`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable consulted when no token is configured
    pub token_env: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            default_level: "info".to_string(),
            console: true,
            file: false,
            json_format: false,
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://shikimori.one/api/graphql".to_string(),
            origin: "https://shikimori.one".to_string(),
            user_agent: "shiki_api_test".to_string(),
            token: None,
            token_env: "SHIKIMORI_TOKEN".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            upstream: UpstreamConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// If the file doesn't exist, returns the default configuration.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Config file not found, using defaults"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Load configuration from a TOML file or create default if not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::from_file(path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to load config, using defaults");
            Self::default()
        })
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = toml::to_string_pretty(self)
            .context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            "Configuration saved successfully"
        );

        Ok(())
    }

    /// Get the path for the log directory
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.logging.log_dir)
    }

    /// Resolve the bearer token from the config file or the environment
    ///
    /// Empty values count as missing.
    pub fn resolve_token(&self) -> Option<String> {
        self.upstream
            .token
            .clone()
            .filter(|t| !t.trim().is_empty())
            .or_else(|| {
                std::env::var(&self.upstream.token_env)
                    .ok()
                    .filter(|t| !t.trim().is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.upstream.endpoint, "https://shikimori.one/api/graphql");
        assert_eq!(config.upstream.token_env, "SHIKIMORI_TOKEN");
        assert_eq!(config.upstream.token, None);
        assert_eq!(config.logging.default_level, "info");
    }

    #[test]
    fn test_save_and_load_config() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");

        let mut original_config = Config::default();
        original_config.upstream.token = Some("secret".to_string());
        original_config.save(&config_path)?;

        assert!(config_path.exists());

        let loaded_config = Config::from_file(&config_path)?;
        assert_eq!(
            loaded_config.upstream.endpoint,
            original_config.upstream.endpoint
        );
        assert_eq!(loaded_config.upstream.token.as_deref(), Some("secret"));

        Ok(())
    }

    #[test]
    fn test_partial_config_uses_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            r#"
[upstream]
endpoint = "http://localhost:9000/graphql"
origin = "http://localhost:9000"
user_agent = "test-agent"
token_env = "TEST_ONLY_UNSET_TOKEN_VAR"
"#,
        )?;

        let config = Config::from_file(&config_path)?;
        assert_eq!(config.upstream.endpoint, "http://localhost:9000/graphql");
        assert_eq!(config.logging.log_dir, "logs");
        assert_eq!(config.resolve_token(), None);

        Ok(())
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        // Should return default config without error
        assert_eq!(config.upstream.origin, "https://shikimori.one");
    }

    #[test]
    fn test_configured_token_wins() {
        let mut config = Config::default();
        config.upstream.token = Some("from-file".to_string());
        config.upstream.token_env = "TEST_ONLY_UNSET_TOKEN_VAR".to_string();
        assert_eq!(config.resolve_token().as_deref(), Some("from-file"));

        config.upstream.token = Some("   ".to_string());
        assert_eq!(config.resolve_token(), None);
    }
}

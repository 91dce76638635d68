//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional.
//!
//! - `SHESHAPE_API_URL` - Backend origin (default: `http://localhost:8080`)
//! - `SHESHAPE_API_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHESHAPE_API_TOKEN` - Bearer token, overrides the token file
//! - `SHESHAPE_TOKEN_FILE` - Persistent token location (default: `$HOME/.sheshape/token`)
//! - `SHESHAPE_PRODUCT_CACHE_TTL_SECS` - Product cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PRODUCT_CACHE_TTL_SECS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
///
/// Implements `Debug` manually to redact the API token.
#[derive(Clone)]
pub struct ClientConfig {
    /// Backend origin, e.g. `https://api.sheshape.com`
    pub api_url: Url,
    /// Timeout applied to every request
    pub timeout: Duration,
    /// Bearer token supplied through the environment
    pub api_token: Option<SecretString>,
    /// Where the token is persisted between runs (`None` keeps it in memory)
    pub token_file: Option<PathBuf>,
    /// Lifetime of cached product pages and details
    pub product_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("timeout", &self.timeout)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("token_file", &self.token_file)
            .field("product_cache_ttl", &self.product_cache_ttl)
            .field("sentry_dsn", &self.sentry_dsn)
            .finish()
    }
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with default timeouts and an
    /// in-memory token.
    #[must_use]
    pub const fn new(api_url: Url) -> Self {
        Self {
            api_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_token: None,
            token_file: None,
            product_cache_ttl: Duration::from_secs(DEFAULT_PRODUCT_CACHE_TTL_SECS),
            sentry_dsn: None,
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let raw_url = get("SHESHAPE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(raw_url.trim()).map_err(|e| {
            ConfigError::InvalidEnvVar("SHESHAPE_API_URL".to_string(), e.to_string())
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                "SHESHAPE_API_URL".to_string(),
                format!("unsupported scheme '{}'", api_url.scheme()),
            ));
        }

        let timeout = parse_secs(
            "SHESHAPE_API_TIMEOUT_SECS",
            get("SHESHAPE_API_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT_SECS,
        )?;
        let product_cache_ttl = parse_secs(
            "SHESHAPE_PRODUCT_CACHE_TTL_SECS",
            get("SHESHAPE_PRODUCT_CACHE_TTL_SECS"),
            DEFAULT_PRODUCT_CACHE_TTL_SECS,
        )?;

        let api_token = get("SHESHAPE_API_TOKEN").map(|t| SecretString::from(t.trim().to_string()));
        let token_file = get("SHESHAPE_TOKEN_FILE").map(PathBuf::from).or_else(|| {
            get("HOME").map(|home| PathBuf::from(home).join(".sheshape").join("token"))
        });

        Ok(Self {
            api_url,
            timeout,
            api_token,
            token_file,
            product_cache_ttl,
            sentry_dsn: get("SENTRY_DSN"),
        })
    }
}

fn parse_secs(key: &str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let Some(value) = value else {
        return Ok(Duration::from_secs(default));
    };
    let secs = value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ClientConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("HOME", "/home/member")]).unwrap();
        assert_eq!(config.api_url.as_str(), "http://localhost:8080/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.product_cache_ttl, Duration::from_secs(300));
        assert_eq!(
            config.token_file,
            Some(PathBuf::from("/home/member/.sheshape/token"))
        );
        assert!(config.api_token.is_none());
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_no_home_means_memory_token() {
        let config = load(&[]).unwrap();
        assert!(config.token_file.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("SHESHAPE_API_URL", "https://api.sheshape.com"),
            ("SHESHAPE_API_TIMEOUT_SECS", "5"),
            ("SHESHAPE_TOKEN_FILE", "/tmp/token"),
            ("SHESHAPE_API_TOKEN", "abc"),
        ])
        .unwrap();
        assert_eq!(config.api_url.host_str(), Some("api.sheshape.com"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.token_file, Some(PathBuf::from("/tmp/token")));
        assert!(config.api_token.is_some());
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            load(&[("SHESHAPE_API_URL", "not a url")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "SHESHAPE_API_URL"
        ));
        assert!(matches!(
            load(&[("SHESHAPE_API_URL", "ftp://files.example.com")]),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            load(&[("SHESHAPE_API_TIMEOUT_SECS", "soon")]),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "SHESHAPE_API_TIMEOUT_SECS"
        ));
        assert!(load(&[("SHESHAPE_PRODUCT_CACHE_TTL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = load(&[("SHESHAPE_API_TOKEN", "super-secret-token")]).unwrap();
        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("super-secret-token"));
        assert!(debug_output.contains("[REDACTED]"));
    }
}

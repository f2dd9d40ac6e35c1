//! Configuration Module
//!
//! Handles loading and validating cache and server configuration from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{CacheError, Result};

// == Cache Config ==
/// Cache behaviour parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a fetched value stays valid
    pub ttl: Duration,
    /// Cadence of the background sweeper
    pub sweep_interval: Duration,
    /// Optional bound on the number of stored entries
    pub max_entries: Option<usize>,
    /// Coalesce concurrent misses on the same key into a single fetch
    pub single_flight: bool,
}

impl CacheConfig {
    /// Creates a config with the given TTL and default everything else.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            ..Self::default()
        }
    }

    pub fn with_sweep_interval(mut self, sweep_interval: Duration) -> Self {
        self.sweep_interval = sweep_interval;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Loads cache settings from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: 300000)
    /// - `SWEEP_INTERVAL_MS` - Sweeper cadence in milliseconds (default: 1000)
    /// - `MAX_ENTRIES` - Capacity bound (default: unbounded)
    /// - `SINGLE_FLIGHT` - `true`/`1` to coalesce concurrent misses (default: false)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            ttl: env_millis("CACHE_TTL_MS").unwrap_or(defaults.ttl),
            sweep_interval: env_millis("SWEEP_INTERVAL_MS").unwrap_or(defaults.sweep_interval),
            max_entries: env_parse("MAX_ENTRIES"),
            single_flight: env::var("SINGLE_FLIGHT")
                .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.single_flight),
        }
    }

    // == Validate ==
    /// Rejects settings the cache cannot run with.
    ///
    /// A sweep interval longer than the TTL is accepted but logged, since it
    /// lets expired entries linger in memory for up to one interval.
    pub fn validate(&self) -> Result<()> {
        if self.ttl.is_zero() {
            return Err(CacheError::Configuration(
                "ttl must be greater than zero".to_string(),
            ));
        }
        if self.sweep_interval.is_zero() {
            return Err(CacheError::Configuration(
                "sweep_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_entries == Some(0) {
            return Err(CacheError::Configuration(
                "max_entries must be greater than zero when set".to_string(),
            ));
        }
        if self.sweep_interval > self.ttl {
            warn!(
                "sweep_interval ({:?}) is longer than ttl ({:?}); expired entries may linger",
                self.sweep_interval, self.ttl
            );
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(1),
            max_entries: None,
            single_flight: false,
        }
    }
}

// == Server Config ==
/// Settings for the HTTP caching proxy binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// HTTP server port
    pub port: u16,
    /// Base URL resources are fetched from
    pub upstream_url: String,
    /// Upper bound on a single read-through
    pub fetch_timeout: Duration,
}

impl ServerConfig {
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `UPSTREAM_URL` - Origin base URL (default: http://127.0.0.1:8080)
    /// - `FETCH_TIMEOUT_MS` - Read-through timeout in milliseconds (default: 5000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("SERVER_PORT").unwrap_or(defaults.port),
            upstream_url: env::var("UPSTREAM_URL").unwrap_or(defaults.upstream_url),
            fetch_timeout: env_millis("FETCH_TIMEOUT_MS").unwrap_or(defaults.fetch_timeout),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.upstream_url.trim().is_empty() {
            return Err(CacheError::Configuration(
                "upstream_url must not be empty".to_string(),
            ));
        }
        if self.fetch_timeout.is_zero() {
            return Err(CacheError::Configuration(
                "fetch_timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            upstream_url: "http://127.0.0.1:8080".to_string(),
            fetch_timeout: Duration::from_secs(5),
        }
    }
}

// == Config ==
/// Full configuration of the proxy server.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub cache: CacheConfig,
    pub server: ServerConfig,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            server: ServerConfig::from_env(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.cache.validate()?;
        self.server.validate()
    }
}

fn env_parse<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

fn env_millis(name: &str) -> Option<Duration> {
    env_parse::<u64>(name).map(Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(1));
        assert_eq!(config.cache.max_entries, None);
        assert!(!config.cache.single_flight);
        assert_eq!(config.server.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "CACHE_TTL_MS",
            "SWEEP_INTERVAL_MS",
            "MAX_ENTRIES",
            "SINGLE_FLIGHT",
            "SERVER_PORT",
            "UPSTREAM_URL",
            "FETCH_TIMEOUT_MS",
        ] {
            env::remove_var(name);
        }

        assert_eq!(Config::from_env(), Config::default());
    }

    #[test]
    fn test_builder_methods() {
        let config = CacheConfig::new(Duration::from_millis(100))
            .with_sweep_interval(Duration::from_millis(20))
            .with_max_entries(10)
            .with_single_flight(true);

        assert_eq!(config.ttl, Duration::from_millis(100));
        assert_eq!(config.sweep_interval, Duration::from_millis(20));
        assert_eq!(config.max_entries, Some(10));
        assert!(config.single_flight);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = CacheConfig::new(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_sweep_interval_rejected() {
        let config = CacheConfig::default().with_sweep_interval(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(CacheError::Configuration(_))
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = CacheConfig::default().with_max_entries(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sweep_longer_than_ttl_is_allowed() {
        let config = CacheConfig::new(Duration::from_millis(10))
            .with_sweep_interval(Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_upstream_rejected() {
        let server = ServerConfig {
            upstream_url: "  ".to_string(),
            ..ServerConfig::default()
        };
        assert!(server.validate().is_err());
    }
}
